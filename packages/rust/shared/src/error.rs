//! Error types for bookport.
//!
//! Library crates use [`BookportError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

/// Top-level error type for all bookport operations.
#[derive(Debug, thiserror::Error)]
pub enum BookportError {
    /// Configuration loading or parsing error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Missing or invalid runtime configuration, caught before any network call.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Transport-level failure: the request produced no response.
    #[error("network error: {0}")]
    Network(String),

    /// The destination API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limiting persisted through every retry attempt.
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// The configured permission level does not allow the operation.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The operator declined or failed the interactive confirmation.
    #[error("operation cancelled: {0}")]
    ConfirmationAborted(String),

    /// A document fragment could not be converted.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookportError>;

impl BookportError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an API error from a status code and server message.
    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: msg.into(),
        }
    }

    /// Create a permission error from any displayable message.
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BookportError::config("missing API token");
        assert_eq!(err.to_string(), "config error: missing API token");

        let err = BookportError::api(400, "body failed validation");
        assert_eq!(err.to_string(), "API error (400): body failed validation");

        let err = BookportError::RateLimited { attempts: 3 };
        assert!(err.to_string().contains("3 attempts"));
    }
}
