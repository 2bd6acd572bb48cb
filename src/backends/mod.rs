//! Concrete backend adapters implementing the communicator contract.

mod gemini;
mod youtrack;

pub use gemini::GeminiCommunicator;
pub use youtrack::YouTrackCommunicator;

/// How an adapter is allowed to present credentials to the backend.
///
/// Injected by the host environment at construction time: hosts whose HTTP
/// stack cannot attach an `Authorization` header (some embedded browser
/// runtimes) select [`CredentialChannel::Cookie`], which carries the same
/// encoded credential as a cookie the server extracts instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialChannel {
    #[default]
    Header,
    Cookie,
}
