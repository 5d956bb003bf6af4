use thiserror::Error;

use shared::types::{LoginError, UploadError};

/// Shown when the server gives no usable message.
pub const FALLBACK_MESSAGE: &str = "API request failed";

/// Shown when a protected operation is attempted without a session.
pub const NOT_SIGNED_IN: &str = "Not signed in";

/// Every failure the data layer can surface to a view.
///
/// `Display` is always the user-facing message, verbatim from the server
/// when it sent one. `Clone` lets one failed request fan out to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Bad form input. Never reaches the network.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// 401/403, or no session at all. Forces a logout.
    #[error("{message}")]
    Authentication { status: Option<u16>, message: String },

    /// Network failure, timeout, or an error body that is not JSON.
    #[error("{message}")]
    Transport { message: String },

    /// The server answered with a JSON error, or with a payload that does
    /// not fit the operation's schema.
    #[error("{message}")]
    Application { status: Option<u16>, message: String },
}

impl ClientError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn transport() -> Self {
        Self::Transport {
            message: FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn not_signed_in() -> Self {
        Self::Authentication {
            status: None,
            message: NOT_SIGNED_IN.to_string(),
        }
    }

    pub fn unexpected_shape(operation: &str, err: impl std::fmt::Display) -> Self {
        Self::Application {
            status: None,
            message: format!("Unexpected response from {}: {}", operation, err),
        }
    }

    /// The text a view should show.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation { message, .. }
            | Self::Authentication { message, .. }
            | Self::Transport { message }
            | Self::Application { message, .. } => message,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Application { status, .. } => *status,
            Self::Validation { .. } | Self::Transport { .. } => None,
        }
    }

    /// The offending form field for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<LoginError> for ClientError {
    fn from(err: LoginError) -> Self {
        Self::validation(err.field(), err.to_message())
    }
}

impl From<UploadError> for ClientError {
    fn from(err: UploadError) -> Self {
        Self::validation(err.field(), err.to_message())
    }
}
