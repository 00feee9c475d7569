//! Failure taxonomy for the harness.
//!
//! Backend verdicts (compilation error, runtime error, wrong answer) are not
//! errors here: they are ordinary outcomes carried in `CodeExecutionResult`.
//! Only conditions that stop a request or a single test case from being
//! graded appear below.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Missing or unusable access credential; raised before any network call
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Empty source or empty test case list
    #[error("invalid input: {0}")]
    Input(String),
    #[error("backend request failed with status {status}: {body}")]
    BackendRequest { status: u16, body: String },
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("submission {token} still pending after {attempts} polls")]
    Timeout { token: String, attempts: u32 },
    #[error("batch deadline of {0:?} exceeded")]
    BatchDeadline(std::time::Duration),
    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl HarnessError {
    /// True for errors that reject the whole request rather than one test case
    pub fn is_precondition(&self) -> bool {
        matches!(self, HarnessError::Configuration(_) | HarnessError::Input(_))
    }
}

impl From<reqwest::Error> for HarnessError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HarnessError::Decode(err.to_string())
        } else {
            HarnessError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
