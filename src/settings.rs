//! Credential/endpoint settings and the persisted key/value contract behind them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known storage key holding the JSON-serialized settings blob.
pub const SETTINGS_KEY: &str = "CommunicatorSettings";
/// Well-known storage key holding the active backend-type identifier.
pub const TYPE_KEY: &str = "CommunicatorType";

/// Immutable snapshot of the active credentials and endpoint. The raw `url`
/// is never the full API root; each adapter derives its own root from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    pub url: String,
    pub login: String,
    pub password: String,
    pub key: String,
}

impl Settings {
    pub fn new(
        url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            login: login.into(),
            password: password.into(),
            key: key.into(),
        }
    }

    /// Resolves the effective settings: an explicit argument wins, else the
    /// persisted blob is parsed, else an empty record. A malformed stored
    /// blob resolves to the empty record rather than failing.
    pub fn resolve(explicit: Option<Settings>, store: &dyn SettingsStore) -> Settings {
        if let Some(settings) = explicit {
            return settings;
        }
        store
            .get(SETTINGS_KEY)
            .and_then(|blob| serde_json::from_str(&blob).ok())
            .unwrap_or_default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// External persistence boundary: a plain string key/value store. Hosts map
/// this onto whatever storage they own; the crate only reads and writes the
/// two well-known keys.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store for hosts without persistence and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, Settings, SettingsStore, SETTINGS_KEY};

    #[test]
    fn accessors_project_the_four_fields_unchanged() {
        let blob = r#"{"Url":"https://tracker.local","Login":"alice","Password":"p4ss","Key":"api-key"}"#;
        let settings: Settings = serde_json::from_str(blob).expect("valid blob");
        assert_eq!(settings.url(), "https://tracker.local");
        assert_eq!(settings.login(), "alice");
        assert_eq!(settings.password(), "p4ss");
        assert_eq!(settings.key(), "api-key");
    }

    #[test]
    fn explicit_settings_win_over_stored_blob() {
        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, r#"{"Url":"https://stored.local"}"#);

        let explicit = Settings::new("https://explicit.local", "bob", "", "");
        let resolved = Settings::resolve(Some(explicit.clone()), &store);
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn stored_blob_is_used_when_no_explicit_settings() {
        let mut store = MemoryStore::new();
        store.set(
            SETTINGS_KEY,
            r#"{"Url":"https://stored.local","Login":"carol","Password":"","Key":"k"}"#,
        );

        let resolved = Settings::resolve(None, &store);
        assert_eq!(resolved.url(), "https://stored.local");
        assert_eq!(resolved.login(), "carol");
        assert_eq!(resolved.key(), "k");
    }

    #[test]
    fn missing_or_malformed_blob_resolves_to_empty_record() {
        let store = MemoryStore::new();
        assert_eq!(Settings::resolve(None, &store), Settings::default());

        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, "not-json");
        assert_eq!(Settings::resolve(None, &store), Settings::default());
    }

    #[test]
    fn partial_blob_fills_remaining_fields_with_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"Url":"https://tracker.local"}"#).expect("valid blob");
        assert_eq!(settings.url(), "https://tracker.local");
        assert_eq!(settings.login(), "");
        assert_eq!(settings.password(), "");
        assert_eq!(settings.key(), "");
    }
}
