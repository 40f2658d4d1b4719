pub mod client;
pub mod config;
pub mod controller;
pub mod messages;
pub mod speech;
pub mod ui;
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Voice capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Voice capture error: {0}")]
    Capture(String),

    #[error("Speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for ParleyError {
    fn from(e: reqwest::Error) -> Self {
        ParleyError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(e: serde_json::Error) -> Self {
        ParleyError::Protocol(e.to_string())
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(e: toml::de::Error) -> Self {
        ParleyError::Config(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Failed exchanges are replaced by a fallback answer
            ParleyError::Transport(_) => true,
            ParleyError::Protocol(_) => true,
            // Missing engines degrade to no-ops
            ParleyError::CaptureUnavailable(_) => true,
            ParleyError::Capture(_) => true,
            ParleyError::SynthesisUnavailable(_) => true,
            ParleyError::Synthesis(_) => true,
            ParleyError::Config(_) => false,
            ParleyError::Channel(_) => false,
            ParleyError::Io(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::Transport(_) | ParleyError::Protocol(_) => {
                "Could not reach the assistant. Please try again.".to_string()
            }
            ParleyError::CaptureUnavailable(_) => {
                "Voice input is not supported on this system.".to_string()
            }
            ParleyError::Capture(_) => "Voice capture failed. Please try again.".to_string(),
            ParleyError::SynthesisUnavailable(_) => {
                "Voice output is not supported. Replies will be shown as text.".to_string()
            }
            ParleyError::Synthesis(_) => {
                "Speech playback failed. Reply is shown as text.".to_string()
            }
            ParleyError::Config(_) => "Configuration error. Please check settings.".to_string(),
            ParleyError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            ParleyError::Io(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_errors_are_recoverable() {
        assert!(ParleyError::Transport("refused".into()).is_recoverable());
        assert!(ParleyError::Protocol("bad json".into()).is_recoverable());
        assert!(!ParleyError::Config("no endpoint".into()).is_recoverable());
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = ParleyError::Config("Endpoint must be an http(s) URL".into());
        assert_eq!(err.user_message(), "Configuration error. Please check settings.");
        assert!(!ParleyError::Synthesis("device lost".into())
            .user_message()
            .contains("device lost"));
    }

    #[test]
    fn test_json_error_maps_to_protocol() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(ParleyError::from(err), ParleyError::Protocol(_)));
    }
}
