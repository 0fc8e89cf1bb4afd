//! Unified client error

use chat_cache::ChunkError;
use chat_common::{ConfigError, TracingError};
use chat_gateway::{DecodeError, SendError};
use chat_http::HttpError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error the client surfaces
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Gateway(#[from] DecodeError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// A REST response did not have the expected shape
    #[error("unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status behind the error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http(HttpError::NotFound(_)))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Http(HttpError::Forbidden(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let err: Error = ConfigError::MissingVar("CHAT_TOKEN").into();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Missing required environment variable: CHAT_TOKEN");

        let err: Error = HttpError::Unauthorized.into();
        assert!(!err.is_not_found());

        let err: Error = ChunkError::TimedOut { partial: Vec::new() }.into();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(err.status(), None);
    }
}
