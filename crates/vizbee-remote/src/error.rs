use serde_json::Value;
use thiserror::Error;
use vizbee_core::report::{format_errors, Reporter, Severity};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network, TLS or timeout failure; the request never got an answer.
    #[error("Error sending request: \n{0}")]
    Request(#[from] reqwest::Error),

    /// 422: the API rejected the payload. `errors` is the API's own map.
    #[error("Errors: {}", format_errors(.errors, false))]
    Validation { errors: Value },

    #[error("The server unexpectedly responded with `{status}` status")]
    UnexpectedStatus { status: u16 },

    #[error("Invalid response from server: {0}")]
    Decode(String),

    #[error("Cannot build HTTP client: {0}")]
    Client(String),
}

impl RemoteError {
    pub fn severity(&self) -> Severity {
        match self {
            RemoteError::Request(_) | RemoteError::Client(_) => Severity::Critical,
            RemoteError::Validation { .. }
            | RemoteError::UnexpectedStatus { .. }
            | RemoteError::Decode(_) => Severity::Warning,
        }
    }

    /// User-facing message; validation errors get the terminal layout when
    /// `interactive`.
    pub fn describe(&self, interactive: bool) -> String {
        match self {
            RemoteError::Validation { errors } => {
                format!("Errors: {}", format_errors(errors, interactive))
            }
            other => other.to_string(),
        }
    }

    pub fn report(&self, reporter: &dyn Reporter) {
        reporter.emit(self.severity(), &self.describe(reporter.is_interactive()));
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;
