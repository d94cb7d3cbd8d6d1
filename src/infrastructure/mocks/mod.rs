//! Test doubles for asserting on limiter logging.

pub mod layer;

pub use layer::{CapturedEvent, MockCaptureLayer};
