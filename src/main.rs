use clap::Parser;
use deposit_velocity::{
    process_partitioned, BuildError, ConfigError, DepositLimiter, ExpectedOutcomes, FeedError,
    LimitsConfig, LimitsOverride, OutcomeVerifier, TransactionFeed, VerificationError,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Apply per-customer deposit velocity limits to a transaction feed.
///
/// Reads one JSON transaction per line and writes one JSON outcome per line.
/// With `--expected`, compares the outcomes against an expected feed instead.
#[derive(Parser, Debug)]
#[command(name = "deposit-velocity", version)]
struct Cli {
    /// Transaction feed (default: stdin)
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Outcome output (default: stdout)
    #[arg(short = 'o', long = "output", conflicts_with = "expected")]
    output: Option<PathBuf>,

    /// Expected outcomes to verify against instead of writing output
    #[arg(short = 'e', long = "expected")]
    expected: Option<PathBuf>,

    /// Limits file with default and per-customer limits
    #[arg(short = 'l', long = "limits")]
    limits: Option<PathBuf>,

    /// Default daily deposit limit
    #[arg(long = "daily-limit")]
    daily_limit: Option<Decimal>,

    /// Default weekly deposit limit
    #[arg(long = "weekly-limit")]
    weekly_limit: Option<Decimal>,

    /// Default number of deposits per day
    #[arg(long = "daily-count-limit")]
    daily_count_limit: Option<u32>,

    /// Worker threads; customers are partitioned across them
    #[arg(short = 'w', long = "workers", default_value = "1")]
    workers: NonZeroUsize,
}

#[derive(Debug)]
enum CliError {
    Io { path: Option<PathBuf>, source: io::Error },
    Config(ConfigError),
    Build(BuildError),
    Feed(FeedError),
    Verification(VerificationError),
    Output(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io {
                path: Some(path),
                source,
            } => write!(f, "{}: {}", path.display(), source),
            CliError::Io { path: None, source } => write!(f, "{}", source),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Build(e) => write!(f, "{}", e),
            CliError::Feed(e) => write!(f, "{}", e),
            CliError::Verification(e) => write!(f, "{}", e),
            CliError::Output(e) => write!(f, "failed to write outcome: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(source: io::Error) -> Self {
        CliError::Io { path: None, source }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        CliError::Build(e)
    }
}

impl From<FeedError> for CliError {
    fn from(e: FeedError) -> Self {
        CliError::Feed(e)
    }
}

impl From<VerificationError> for CliError {
    fn from(e: VerificationError) -> Self {
        CliError::Verification(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}

fn open(path: &PathBuf) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Io {
        path: Some(path.clone()),
        source,
    })
}

fn build_limiter(cli: &Cli) -> Result<DepositLimiter, CliError> {
    let config = match &cli.limits {
        Some(path) => LimitsConfig::from_path(path)?,
        None => LimitsConfig::default(),
    };
    let flags = LimitsOverride {
        daily_deposit_limit: cli.daily_limit,
        weekly_deposit_limit: cli.weekly_limit,
        daily_deposit_count_limit: cli.daily_count_limit,
    };
    let config = config.override_default(flags);

    Ok(config.apply(DepositLimiter::builder()).build()?)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let limiter = build_limiter(&cli)?;

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut feed = TransactionFeed::new(reader);
    let transactions = feed.by_ref().collect::<Result<Vec<_>, _>>()?;
    info!(
        transactions = transactions.len(),
        duplicates = feed.duplicates(),
        lines = feed.lines_read(),
        "Read transaction feed"
    );

    let outcomes = process_partitioned(&limiter, transactions, cli.workers);

    match &cli.expected {
        Some(path) => {
            let expected = ExpectedOutcomes::from_reader(BufReader::new(open(path)?))?;
            let mut verifier = OutcomeVerifier::new(expected);
            for outcome in &outcomes {
                verifier.verify(outcome)?;
            }
            let report = verifier.finish();
            if report.unmatched > 0 {
                warn!(
                    unmatched = report.unmatched,
                    "Expected outcomes without a matching transaction"
                );
            }
            println!(
                "verified {} outcomes ({} accepted, {} rejected)",
                report.checked, report.accepted, report.rejected
            );
        }
        None => {
            let writer: Box<dyn Write> = match &cli.output {
                Some(path) => Box::new(File::create(path).map_err(|source| CliError::Io {
                    path: Some(path.clone()),
                    source,
                })?),
                None => Box::new(io::stdout().lock()),
            };
            let mut writer = BufWriter::new(writer);
            for outcome in &outcomes {
                serde_json::to_writer(&mut writer, &outcome.to_record())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
    }

    let snapshot = limiter.metrics().snapshot();
    info!(
        accepted = snapshot.deposits_accepted,
        rejected = snapshot.deposits_rejected(),
        accounts = snapshot.accounts_opened,
        daily_resets = snapshot.daily_resets,
        weekly_resets = snapshot.weekly_resets,
        "Finished processing"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
