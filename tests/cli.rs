use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

const FEED: &str = r#"{"id":"15887","customer_id":"528","load_amount":"$3318.47","time":"2000-01-01T00:00:00Z"}
{"id":"30081","customer_id":"154","load_amount":"$1413.18","time":"2000-01-01T01:01:22Z"}
{"id":"15089","customer_id":"528","load_amount":"$1,981.53","time":"2000-01-01T04:05:28Z"}
{"id":"15887","customer_id":"528","load_amount":"$3318.47","time":"2000-01-01T06:00:00Z"}
"#;

const EXPECTED: &str = r#"{"id":"15887","customer_id":"528","accepted":true}
{"id":"30081","customer_id":"154","accepted":true}
{"id":"15089","customer_id":"528","accepted":false}
"#;

fn file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("deposit-velocity").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_stdin_to_stdout() {
    let output = cli().write_stdin(FEED).output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), EXPECTED);
}

#[test]
fn test_input_and_output_files() {
    let input = file(FEED);
    let output = NamedTempFile::new().unwrap();

    cli()
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(output.path()).unwrap(), EXPECTED);
}

#[test]
fn test_verify_passes() {
    let input = file(FEED);
    let expected = file(EXPECTED);

    let output = cli()
        .arg("-i")
        .arg(input.path())
        .arg("-e")
        .arg(expected.path())
        .arg("--workers")
        .arg("2")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "verified 3 outcomes (2 accepted, 1 rejected)\n"
    );
}

#[test]
fn test_verify_mismatch_fails() {
    let input = file(FEED);
    let expected = file(EXPECTED);

    // A higher daily limit accepts 15089
    let output = cli()
        .arg("-i")
        .arg(input.path())
        .arg("-e")
        .arg(expected.path())
        .arg("--daily-limit")
        .arg("6000")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("15089"));
    assert!(stderr.contains("expected accepted=false, got accepted=true"));
}

#[test]
fn test_limits_file_is_applied() {
    let limits = file(r#"{"customers": {"528": {"daily_deposit_limit": "6000"}}}"#);

    let output = cli()
        .arg("--limits")
        .arg(limits.path())
        .write_stdin(FEED)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(r#"{"id":"15089","customer_id":"528","accepted":true}"#));
}

#[test]
fn test_missing_limits_file_fails() {
    let output = cli()
        .arg("--limits")
        .arg("/nonexistent/limits.json")
        .write_stdin(FEED)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)
        .unwrap()
        .contains("failed to read limits file"));
}

#[test]
fn test_malformed_feed_fails() {
    let output = cli()
        .write_stdin("{\"id\":\"1\"}\n")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
