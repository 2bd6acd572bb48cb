//! Backend-neutral communicator layer for issue tracker integrations.
//!
//! A host application reports, searches and comments on issues through one
//! polymorphic [`Communicator`] contract. The [`loader`] resolves which
//! backend adapter is active from a stored identifier, and the [`fields`]
//! module models the dependent dropdown cascade (project → components,
//! project template → type/priority/severity/status) that drives issue
//! creation forms.

pub mod backends;
pub mod communicator;
pub mod error;
pub mod fields;
mod http;
pub mod loader;
pub mod settings;

pub use backends::{CredentialChannel, GeminiCommunicator, YouTrackCommunicator};
pub use communicator::{Communicator, IssueDraft, SearchResult};
pub use error::{CommunicatorError, Result};
pub use fields::{FieldInfo, FieldOption};
pub use loader::{load, BackendKind};
pub use settings::{MemoryStore, Settings, SettingsStore, SETTINGS_KEY, TYPE_KEY};
