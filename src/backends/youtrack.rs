//! YouTrack adapter: form-encoded requests, cookie-session auth.
//!
//! Authentication is a dedicated login exchange; subsequent calls ride on
//! the session cookie the login drops into this instance's cookie jar.
//! The field graph is a single root Project node with no children.

use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::communicator::{Communicator, IssueDraft, SearchResult};
use crate::error::{CommunicatorError, Result};
use crate::fields::{FieldInfo, FieldOption};
use crate::http;
use crate::loader::BackendKind;
use crate::settings::Settings;

const BACKEND_NAME: &str = "YouTrack";
const ATTACHMENT_NAME: &str = "screenshot.png";

pub struct YouTrackCommunicator {
    settings: Settings,
    http: Option<Client>,
    project_field: Mutex<Option<FieldInfo>>,
}

impl YouTrackCommunicator {
    pub fn new(settings: Settings) -> Self {
        // Session auth needs a cookie jar; the login response's cookie must
        // ride on every later request.
        let http = http::build_client(BACKEND_NAME, true);
        Self {
            settings,
            http,
            project_field: Mutex::new(None),
        }
    }

    fn rest_root(&self) -> String {
        format!("{}/rest/", self.settings.url().trim_end_matches('/'))
    }

    fn client(&self) -> Result<&Client> {
        self.http
            .as_ref()
            .ok_or(CommunicatorError::connection(BACKEND_NAME))
    }

    async fn post_form(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.send_form(Method::POST, path, params).await
    }

    async fn send_form(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let url = format!("{}{}", self.rest_root(), path);
        debug!(backend = BACKEND_NAME, %method, %url, "sending request");
        let response = self
            .client()?
            .request(method, &url)
            .header(ACCEPT, "application/json")
            .form(params)
            .send()
            .await
            .map_err(|err| http::classify_send_error(BACKEND_NAME, err))?;
        http::value_or_text(BACKEND_NAME, response).await
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.rest_root(), path);
        debug!(backend = BACKEND_NAME, method = "GET", %url, "sending request");
        let response = self
            .client()?
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|err| http::classify_send_error(BACKEND_NAME, err))?;
        http::value_or_text(BACKEND_NAME, response).await
    }

    /// Dedicated login exchange establishing the session cookie.
    pub async fn authenticate(&self) -> Result<()> {
        let params = [
            ("login", self.settings.login()),
            ("password", self.settings.password()),
        ];
        self.post_form("user/login", &params).await.map(|_| ())
    }

    fn field(&self) -> FieldInfo {
        self.project_field
            .lock()
            .unwrap()
            .get_or_insert_with(|| FieldInfo::new("project", "Project"))
            .clone()
    }
}

#[async_trait]
impl Communicator for YouTrackCommunicator {
    fn backend(&self) -> BackendKind {
        BackendKind::YouTrack
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn test(&self) -> Result<()> {
        self.authenticate().await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let value = self.get_json("issue", &[("filter", query)]).await?;
        let listing: IssueListing = serde_json::from_value(value)
            .map_err(|_| CommunicatorError::authentication(BACKEND_NAME))?;
        Ok(listing
            .issue
            .into_iter()
            .map(|entry| SearchResult {
                name: entry.summary(),
                id: entry.id,
            })
            .collect())
    }

    async fn comment(&self, _project_id: &str, issue_id: &str, text: &str) -> Result<()> {
        let path = format!("issue/{}/execute", issue_id);
        self.post_form(&path, &[("comment", text)]).await.map(|_| ())
    }

    async fn attach(&self, _project_id: &str, issue_id: &str, content: &[u8]) -> Result<()> {
        let path = format!("issue/{}/attachment", issue_id);
        let encoded = BASE64_STANDARD.encode(content);
        let params = [("name", ATTACHMENT_NAME), ("content", encoded.as_str())];
        self.post_form(&path, &params).await.map(|_| ())
    }

    async fn create(&self, draft: &IssueDraft) -> Result<()> {
        // This backend only understands project/summary/description; the
        // remaining draft fields are omitted.
        let params = [
            ("project", draft.project.as_str()),
            ("summary", draft.title.as_str()),
            ("description", draft.description.as_str()),
        ];
        self.post_form("issue", &params).await.map(|_| ())
    }

    async fn load_projects(&self) -> Result<Vec<FieldOption>> {
        let value = self.get_json("project/all", &[]).await?;
        let projects: Vec<ProjectEntry> = serde_json::from_value(value)
            .map_err(|_| CommunicatorError::authentication(BACKEND_NAME))?;
        Ok(projects
            .into_iter()
            .map(|project| FieldOption::new(project.short_name, project.name))
            .collect())
    }

    fn fields(&self) -> Vec<FieldInfo> {
        vec![self.field()]
    }

    async fn populate_fields(&self) -> Result<()> {
        let field = self.field();
        let projects = self.load_projects().await?;
        field.populate(projects);
        Ok(())
    }

    async fn select(&self, field_id: &str, option: FieldOption) -> Result<()> {
        // No dependent metadata: a project selection changes nothing else.
        let field = self.field();
        if field.id() == field_id {
            field.set_value(option);
        } else {
            debug!(backend = BACKEND_NAME, field_id, "ignoring selection on unknown field");
        }
        Ok(())
    }
}

#[derive(Deserialize, Default)]
struct IssueListing {
    #[serde(default)]
    issue: Vec<IssueEntry>,
}

#[derive(Deserialize)]
struct IssueEntry {
    id: String,
    #[serde(default)]
    field: Vec<IssueFieldEntry>,
}

#[derive(Deserialize)]
struct IssueFieldEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: Value,
}

impl IssueEntry {
    /// First field named `summary` wins; issues without one display as an
    /// empty string.
    fn summary(&self) -> String {
        self.field
            .iter()
            .find(|field| field.name == "summary")
            .and_then(|field| field.value.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Deserialize)]
struct ProjectEntry {
    #[serde(rename = "shortName", default)]
    short_name: String,
    #[serde(default)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::{IssueEntry, YouTrackCommunicator};
    use crate::settings::Settings;
    use serde_json::json;

    #[test]
    fn rest_root_appends_suffix_once() {
        let adapter = YouTrackCommunicator::new(Settings::new("https://yt.local/", "", "", ""));
        assert_eq!(adapter.rest_root(), "https://yt.local/rest/");
    }

    #[test]
    fn summary_scan_takes_first_match() {
        let entry: IssueEntry = serde_json::from_value(json!({
            "id": "YT-1",
            "field": [
                {"name": "state", "value": "Open"},
                {"name": "summary", "value": "First summary"},
                {"name": "summary", "value": "Second summary"}
            ]
        }))
        .unwrap();
        assert_eq!(entry.summary(), "First summary");
    }

    #[test]
    fn missing_summary_yields_empty_string() {
        let entry: IssueEntry = serde_json::from_value(json!({
            "id": "YT-2",
            "field": [{"name": "state", "value": "Open"}]
        }))
        .unwrap();
        assert_eq!(entry.summary(), "");
    }
}
