//! Grades submitted functions against input/output test cases on a remote
//! Judge0-compatible sandbox, with a heuristic fallback when the sandbox is
//! unreachable.

pub mod client;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod fallback;
pub mod language_config;
pub mod poller;
pub mod synthesizer;


pub use client::{BackendLanguage, BackendStatus, ExecutionBackend, Judge0Client, SubmissionRecord};
pub use error::{HarnessError, Result};
pub use executor::Harness;
pub use fallback::FallbackExecutor;
pub use language_config::LanguageConfigManager;
