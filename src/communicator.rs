//! The polymorphic contract every backend adapter implements.

use async_trait::async_trait;

use crate::error::Result;
use crate::fields::{FieldInfo, FieldOption};
use crate::loader::BackendKind;
use crate::settings::Settings;

/// One issue found by a search, normalized to the same shape regardless of
/// backend. `name` is synthesized from backend-specific title fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
}

/// Payload for creating a new issue. Everything beyond title, description
/// and project is backend-specific; absent fields are omitted from the wire
/// payload or left to backend defaults.
#[derive(Debug, Clone, Default)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub project: String,
    pub component: Option<String>,
    pub issue_type: Option<String>,
    pub priority: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
}

impl IssueDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            project: project.into(),
            ..Self::default()
        }
    }
}

/// Capability set shared by every backend adapter.
///
/// Construction never fails, even with incomplete settings; failures surface
/// only when a network operation is attempted, classified per
/// [`crate::error::CommunicatorError`]. Each async operation is a single
/// HTTP exchange (or a small composed sequence) with no retries.
#[async_trait]
pub trait Communicator: Send + Sync {
    /// Identifier of the concrete backend this adapter talks to.
    fn backend(&self) -> BackendKind;

    /// The settings snapshot this instance was constructed with.
    fn settings(&self) -> &Settings;

    /// Verifies reachability and credentials with a minimal authenticated
    /// request. Adapters without a dedicated endpoint probe a listing call.
    async fn test(&self) -> Result<()>;

    /// Runs a backend-specific query, passed through verbatim. A successful
    /// response with zero matches is an empty list, not an error.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    async fn comment(&self, project_id: &str, issue_id: &str, text: &str) -> Result<()>;

    /// Uploads binary content attached to an issue. The content travels
    /// inside a structured payload, never as a multipart stream.
    async fn attach(&self, project_id: &str, issue_id: &str, content: &[u8]) -> Result<()>;

    async fn create(&self, draft: &IssueDraft) -> Result<()>;

    async fn load_projects(&self) -> Result<Vec<FieldOption>>;

    /// Returns the field graph synchronously, building it on first call.
    /// Option lists are populated out of band ([`Communicator::populate_fields`],
    /// [`Communicator::select`]) and are eventually consistent.
    fn fields(&self) -> Vec<FieldInfo>;

    /// Loads option lists for the root fields of the graph.
    async fn populate_fields(&self) -> Result<()>;

    /// Records a selection on the named field and drives the declared
    /// parent→child cascade. Child fetches are tagged with the selection
    /// epoch; stale resolutions never overwrite newer ones.
    async fn select(&self, field_id: &str, option: FieldOption) -> Result<()>;
}
