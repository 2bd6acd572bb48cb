//! Backend selection: maps stored identifiers onto the closed adapter set.

use std::fmt;

use crate::backends::{CredentialChannel, GeminiCommunicator, YouTrackCommunicator};
use crate::communicator::Communicator;
use crate::settings::{Settings, SettingsStore, TYPE_KEY};

/// The closed set of supported backends. Adding one is a new variant plus a
/// match arm here; no existing adapter changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Gemini,
    YouTrack,
}

impl BackendKind {
    /// The stored/selected identifier string naming this backend.
    pub fn identifier(self) -> &'static str {
        match self {
            BackendKind::Gemini => "Gemini",
            BackendKind::YouTrack => "YouTrack",
        }
    }

    pub fn from_identifier(value: &str) -> Option<Self> {
        match value {
            "Gemini" => Some(BackendKind::Gemini),
            "YouTrack" => Some(BackendKind::YouTrack),
            _ => None,
        }
    }

    /// Instantiates the adapter for this backend. Settings injection stays
    /// the caller's responsibility; construction itself never fails.
    pub fn build(
        self,
        settings: Settings,
        channel: CredentialChannel,
    ) -> Box<dyn Communicator> {
        match self {
            BackendKind::Gemini => Box::new(GeminiCommunicator::new(settings, channel)),
            BackendKind::YouTrack => Box::new(YouTrackCommunicator::new(settings)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Resolves which backend is active: explicit request, else the persisted
/// identifier, else the default. Unrecognized identifiers silently fall back
/// to the default; that is never an error.
pub fn load(requested: Option<&str>, store: &dyn SettingsStore) -> BackendKind {
    requested
        .map(str::to_owned)
        .or_else(|| store.get(TYPE_KEY))
        .and_then(|identifier| BackendKind::from_identifier(&identifier))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{load, BackendKind};
    use crate::backends::CredentialChannel;
    use crate::settings::{MemoryStore, Settings, SettingsStore, TYPE_KEY};

    #[test]
    fn identifiers_round_trip() {
        for kind in [BackendKind::Gemini, BackendKind::YouTrack] {
            assert_eq!(BackendKind::from_identifier(kind.identifier()), Some(kind));
            assert_eq!(kind.to_string(), kind.identifier());
        }
    }

    #[test]
    fn explicit_identifier_wins_over_stored_one() {
        let mut store = MemoryStore::new();
        store.set(TYPE_KEY, "Gemini");
        assert_eq!(load(Some("YouTrack"), &store), BackendKind::YouTrack);
    }

    #[test]
    fn stored_identifier_is_used_when_nothing_requested() {
        let mut store = MemoryStore::new();
        store.set(TYPE_KEY, "YouTrack");
        assert_eq!(load(None, &store), BackendKind::YouTrack);
    }

    #[test]
    fn build_returns_the_matching_adapter() {
        for kind in [BackendKind::Gemini, BackendKind::YouTrack] {
            let communicator = kind.build(Settings::default(), CredentialChannel::default());
            assert_eq!(communicator.backend(), kind);
        }
    }

    #[test]
    fn absent_or_unrecognized_identifier_falls_back_to_default() {
        let store = MemoryStore::new();
        assert_eq!(load(None, &store), BackendKind::Gemini);
        assert_eq!(load(Some("Bugzilla"), &store), BackendKind::Gemini);

        let mut store = MemoryStore::new();
        store.set(TYPE_KEY, "NotABackend");
        assert_eq!(load(None, &store), BackendKind::Gemini);
    }
}
