use thiserror::Error;

use super::response::VstsResponse;
use crate::util::text::truncate_chars;

/// Longest slice of a response body carried in an error message.
pub const MESSAGE_LIMIT: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    RequestFailed,
    Transport,
    Internal,
}

/// A failed attempt to talk to VSTS, tagged by what went wrong.
#[derive(Debug, Error)]
pub enum VstsError {
    #[error("{}", short_message(.0))]
    Unauthorized(VstsResponse),

    #[error("{}", short_message(.0))]
    RequestFailed(VstsResponse),

    #[error("{}", truncate_chars(.message, MESSAGE_LIMIT))]
    Transport { message: String },

    #[error("{message}")]
    Internal { message: String },
}

fn short_message(response: &VstsResponse) -> String {
    truncate_chars(&response.text, MESSAGE_LIMIT)
}

impl VstsError {
    pub const INTERNAL_STATUS: u16 = 500;

    /// Classify a received response with a non-success status.
    pub fn from_response(response: VstsResponse) -> Self {
        if response.status_code == 401 {
            Self::Unauthorized(response)
        } else {
            Self::RequestFailed(response)
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal {
            message: "Internal error".into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::RequestFailed(_) => ErrorKind::RequestFailed,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(resp) | Self::RequestFailed(resp) => Some(resp.status_code),
            Self::Transport { .. } => None,
            Self::Internal { .. } => Some(Self::INTERNAL_STATUS),
        }
    }

    /// The parsed body, when the error came from an HTTP response.
    pub fn response(&self) -> Option<&VstsResponse> {
        match self {
            Self::Unauthorized(resp) | Self::RequestFailed(resp) => Some(resp),
            _ => None,
        }
    }

    /// Untruncated text behind the error.
    pub fn text(&self) -> &str {
        match self {
            Self::Unauthorized(resp) | Self::RequestFailed(resp) => &resp.text,
            Self::Transport { message } | Self::Internal { message } => message,
        }
    }
}
