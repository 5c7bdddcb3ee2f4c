//! Content-analysis collaborator: turns a text preview into a suggested filename.
//!
//! The remote service sits behind [`NameSuggester`]. [`ContentAnalyzer`] owns one
//! suggester plus an explicit availability state, and trips a sticky breaker the
//! first time the service rejects the credentials.

pub mod credentials;
pub mod openai;

use thiserror::Error;
use tracing::{error, warn};

pub use credentials::{validate_and_clean_api_key, ApiKey, KeyFormatError, KeyKind};
pub use openai::{ApiFlavor, OpenAiSuggester};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("{0}")]
    Other(String),
}

impl SuggestError {
    /// Sort a raw service or transport message into an error kind.
    pub fn classify(message: &str) -> SuggestError {
        let lower = message.to_lowercase();
        if lower.contains("invalid_api_key") || lower.contains("401") {
            SuggestError::InvalidCredentials(message.to_string())
        } else if lower.contains("insufficient_quota")
            || lower.contains("429")
            || lower.contains("rate_limit")
        {
            SuggestError::Quota(message.to_string())
        } else if lower.contains("model") {
            SuggestError::Model(message.to_string())
        } else {
            SuggestError::Other(message.to_string())
        }
    }
}

/// Single capability of the content-analysis service.
pub trait NameSuggester {
    /// Suggest a descriptive base filename. An empty string means no suggestion.
    fn suggest_name(&self, stem: &str, extension: &str, preview: &str) -> Result<String, SuggestError>;

    /// Cheap round trip used to verify credentials before a run.
    fn check_connection(&self) -> Result<(), SuggestError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableReason {
    /// No API key was available.
    NotConfigured,
    /// Turned off by `--no-ai` or configuration.
    TurnedOff,
    /// The startup connection check failed.
    ConnectionFailed(String),
    /// The service rejected the key mid-run. Never retried.
    InvalidCredentials(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerState {
    Available,
    Disabled(DisableReason),
}

pub struct ContentAnalyzer {
    suggester: Option<Box<dyn NameSuggester>>,
    state: AnalyzerState,
}

impl ContentAnalyzer {
    pub fn new(suggester: Box<dyn NameSuggester>) -> Self {
        Self {
            suggester: Some(suggester),
            state: AnalyzerState::Available,
        }
    }

    pub fn disabled(reason: DisableReason) -> Self {
        Self {
            suggester: None,
            state: AnalyzerState::Disabled(reason),
        }
    }

    /// Verify the connection, disabling the analyzer if it fails.
    pub fn verified(suggester: Box<dyn NameSuggester>) -> Self {
        match suggester.check_connection() {
            Ok(()) => Self::new(suggester),
            Err(e) => {
                error!("Content analysis connection test failed: {}", e);
                Self::disabled(DisableReason::ConnectionFailed(e.to_string()))
            }
        }
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == AnalyzerState::Available
    }

    /// Ask for a name suggestion. Any failure yields an empty string; a
    /// credential failure also disables the analyzer for the rest of the run.
    pub fn suggest(&mut self, file_name: &str, stem: &str, extension: &str, preview: &str) -> String {
        if !self.is_available() {
            return String::new();
        }
        let Some(suggester) = self.suggester.as_ref() else {
            return String::new();
        };

        match suggester.suggest_name(stem, extension, preview) {
            Ok(name) => name,
            Err(SuggestError::InvalidCredentials(msg)) => {
                error!("Invalid API key while analyzing {}; disabling content analysis", file_name);
                self.state = AnalyzerState::Disabled(DisableReason::InvalidCredentials(msg));
                self.suggester = None;
                String::new()
            }
            Err(SuggestError::Quota(msg)) => {
                error!("Quota or rate limit exceeded for {}: {}", file_name, msg);
                String::new()
            }
            Err(SuggestError::Model(msg)) => {
                error!("Model error for {}: {}", file_name, msg);
                String::new()
            }
            Err(SuggestError::Other(msg)) => {
                warn!("AI analysis failed for {}: {}", file_name, msg);
                String::new()
            }
        }
    }
}
