//! Error model shared by every communicator backend.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommunicatorError>;

/// Classified failure surfaced by communicator operations. Every transport
/// or protocol problem collapses into one of two kinds at the adapter
/// boundary: the endpoint could not be reached, or the backend rejected the
/// supplied credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommunicatorError {
    #[error("Unable to connect to {backend} at specified URL.")]
    Connection { backend: &'static str },
    #[error("Unable to login using supplied credentials.")]
    Authentication { backend: &'static str },
}

impl CommunicatorError {
    pub fn connection(backend: &'static str) -> Self {
        CommunicatorError::Connection { backend }
    }

    pub fn authentication(backend: &'static str) -> Self {
        CommunicatorError::Authentication { backend }
    }

    /// Name of the backend the failing operation was issued against.
    pub fn backend(&self) -> &'static str {
        match self {
            CommunicatorError::Connection { backend } => backend,
            CommunicatorError::Authentication { backend } => backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CommunicatorError;

    #[test]
    fn connection_message_names_the_backend() {
        let err = CommunicatorError::connection("Gemini");
        assert_eq!(
            err.to_string(),
            "Unable to connect to Gemini at specified URL."
        );
        assert_eq!(err.backend(), "Gemini");
    }

    #[test]
    fn authentication_message_is_backend_neutral() {
        let err = CommunicatorError::authentication("YouTrack");
        assert_eq!(err.to_string(), "Unable to login using supplied credentials.");
        assert_eq!(err.backend(), "YouTrack");
    }
}
