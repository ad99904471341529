pub mod config;
pub mod engine;
pub mod error;
pub mod mover;
pub mod naming;
pub mod platform;
pub mod processor;
pub mod progress;
pub mod scanner;
pub mod storage;
pub mod summary;

pub use config::{AppConfig, IngestConfig};
pub use engine::IngestEngine;
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use summary::RunSummary;
