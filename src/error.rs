//! Error taxonomy for a fix request.
//!
//! Every variant of [`FixError`] is fatal for the current invocation and is
//! reported as a single `{"error": ...}` record. "No confident fix" is not an
//! error and has no variant here.

use crate::decoder::DecodeError;
use std::time::Duration;
use thiserror::Error;

/// Exit status for a completed run (fix or no-fix).
pub const EXIT_OK: i32 = 0;
/// Exit status for config sub-command failures.
pub const EXIT_CONFIG: i32 = 1;
/// Exit status for failures detected before any network activity.
pub const EXIT_PREFLIGHT: i32 = 2;
/// Exit status for generation service failures.
pub const EXIT_SERVICE: i32 = 3;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("GEMINI_API_KEY is not set")]
    MissingCredential,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not decode {field}: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("Gemini error: {0}")]
    Service(String),

    #[error("Gemini error: request timed out after {}s", .0.as_secs())]
    ServiceTimeout(Duration),
}

impl FixError {
    /// Process exit status the calling shell branches on.
    pub fn exit_code(&self) -> i32 {
        match self {
            FixError::MissingCredential | FixError::InvalidInput(_) | FixError::Decode { .. } => {
                EXIT_PREFLIGHT
            }
            FixError::Service(_) | FixError::ServiceTimeout(_) => EXIT_SERVICE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_errors_share_exit_code() {
        assert_eq!(FixError::MissingCredential.exit_code(), EXIT_PREFLIGHT);
        assert_eq!(FixError::InvalidInput("x".into()).exit_code(), EXIT_PREFLIGHT);
        let decode = FixError::Decode {
            field: "--cmd-b64",
            source: DecodeError::Base64("bad".into()),
        };
        assert_eq!(decode.exit_code(), EXIT_PREFLIGHT);
        assert_eq!(decode.to_string(), "could not decode --cmd-b64: malformed base64: bad");
    }

    #[test]
    fn test_service_errors_use_service_exit_code() {
        assert_eq!(FixError::Service("boom".into()).exit_code(), EXIT_SERVICE);
        assert_eq!(
            FixError::ServiceTimeout(Duration::from_secs(5)).exit_code(),
            EXIT_SERVICE
        );
    }

    #[test]
    fn test_timeout_message_mentions_seconds() {
        let err = FixError::ServiceTimeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Gemini error: request timed out after 60s");
    }

    #[test]
    fn test_missing_credential_message() {
        assert_eq!(FixError::MissingCredential.to_string(), "GEMINI_API_KEY is not set");
    }
}
