//! Gemini adapter: JSON bodies, Basic-style credential on every request.
//!
//! The field cascade here is the deep one: Project is the root, Component
//! reacts to the selected project, and the project's template id drives
//! four independent sibling fetches (Type, Priority, Severity, Status).

use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::backends::CredentialChannel;
use crate::communicator::{Communicator, IssueDraft, SearchResult};
use crate::error::{CommunicatorError, Result};
use crate::fields::{FieldInfo, FieldOption};
use crate::http;
use crate::loader::BackendKind;
use crate::settings::Settings;

const BACKEND_NAME: &str = "Gemini";
const REPORTER_USER_ID: &str = "1";
const ATTACHMENT_NAME: &str = "screenshot.png";
const ATTACHMENT_CONTENT_TYPE: &str = "image/png";
const SEARCH_MAX_ITEMS: u32 = 10;

pub struct GeminiCommunicator {
    settings: Settings,
    channel: CredentialChannel,
    http: Option<Client>,
    fields: Mutex<Option<GeminiFields>>,
}

#[derive(Clone)]
struct GeminiFields {
    project: FieldInfo,
    component: FieldInfo,
    issue_type: FieldInfo,
    priority: FieldInfo,
    severity: FieldInfo,
    status: FieldInfo,
}

impl GeminiFields {
    fn build() -> Self {
        Self {
            project: FieldInfo::new("project", "Project"),
            component: FieldInfo::new("component", "Component"),
            issue_type: FieldInfo::new("type", "Type"),
            priority: FieldInfo::new("priority", "Priority"),
            severity: FieldInfo::new("severity", "Severity"),
            status: FieldInfo::new("status", "Status"),
        }
    }

    fn all(&self) -> Vec<FieldInfo> {
        vec![
            self.project.clone(),
            self.component.clone(),
            self.issue_type.clone(),
            self.priority.clone(),
            self.severity.clone(),
            self.status.clone(),
        ]
    }

    fn find(&self, field_id: &str) -> Option<FieldInfo> {
        self.all().into_iter().find(|field| field.id() == field_id)
    }
}

impl GeminiCommunicator {
    pub fn new(settings: Settings, channel: CredentialChannel) -> Self {
        let http = http::build_client(BACKEND_NAME, false);
        Self {
            settings,
            channel,
            http,
            fields: Mutex::new(None),
        }
    }

    /// API root derived from the raw endpoint; the stored URL never carries
    /// the `/api/` suffix itself.
    fn api_root(&self) -> String {
        format!("{}/api/", self.settings.url().trim_end_matches('/'))
    }

    fn credential(&self) -> String {
        BASE64_STANDARD.encode(format!("{}:{}", self.settings.login(), self.settings.key()))
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let http = self
            .http
            .as_ref()
            .ok_or(CommunicatorError::connection(BACKEND_NAME))?;
        let url = format!("{}{}", self.api_root(), path);
        debug!(backend = BACKEND_NAME, %method, %url, "sending request");

        let mut request = http.request(method, &url).header(ACCEPT, "*/*");
        request = match self.channel {
            CredentialChannel::Header => {
                request.header(AUTHORIZATION, format!("Basic {}", self.credential()))
            }
            CredentialChannel::Cookie => {
                request.header(COOKIE, format!("authorizationCookie={}", self.credential()))
            }
        };
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = request
            .send()
            .await
            .map_err(|err| http::classify_send_error(BACKEND_NAME, err))?;
        http::expect_json(BACKEND_NAME, response).await
    }

    async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, path, Option::<&Value>::None).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn load_components(&self, project_id: &str) -> Result<Vec<FieldOption>> {
        let path = format!("projects/{}/components", project_id);
        let envelopes: Vec<EntityEnvelope> = self.get(&path).await?;
        let mut options: Vec<FieldOption> = envelopes
            .into_iter()
            .map(|envelope| envelope.base_entity.into_option())
            .collect();
        if options.is_empty() {
            options.push(FieldOption::placeholder());
        }
        Ok(options)
    }

    async fn load_metadata(&self, control: &str, template_id: &str) -> Result<Vec<FieldOption>> {
        let path = format!("{}/template/{}", control, template_id);
        let entities: Vec<RawEntity> = self.get(&path).await?;
        Ok(entities.into_iter().map(RawEntity::into_option).collect())
    }

    fn field_graph(&self) -> GeminiFields {
        self.fields
            .lock()
            .unwrap()
            .get_or_insert_with(GeminiFields::build)
            .clone()
    }
}

#[async_trait]
impl Communicator for GeminiCommunicator {
    fn backend(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn test(&self) -> Result<()> {
        self.load_projects().await.map(|_| ())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let request = SearchRequest {
            search_keywords: query,
            include_closed: "false",
            projects: "ALL",
            max_items_to_return: SEARCH_MAX_ITEMS,
        };
        let items: Vec<SearchItem> = self.post("items/filtered", &request).await?;
        Ok(items.into_iter().map(SearchItem::into_result).collect())
    }

    async fn comment(&self, project_id: &str, issue_id: &str, text: &str) -> Result<()> {
        let request = CommentRequest {
            project_id,
            issue_id,
            user_id: REPORTER_USER_ID,
            comment: text,
        };
        let path = format!("items/{}/comments", issue_id);
        let _: Value = self.post(&path, &request).await?;
        Ok(())
    }

    async fn attach(&self, project_id: &str, issue_id: &str, content: &[u8]) -> Result<()> {
        let request = AttachmentRequest {
            project_id,
            issue_id,
            name: ATTACHMENT_NAME,
            content_type: ATTACHMENT_CONTENT_TYPE,
            content: BASE64_STANDARD.encode(content),
        };
        let path = format!("items/{}/attachments", issue_id);
        let _: Value = self.post(&path, &request).await?;
        Ok(())
    }

    async fn create(&self, draft: &IssueDraft) -> Result<()> {
        let request = CreateRequest {
            title: &draft.title,
            description: &draft.description,
            project_id: &draft.project,
            components: draft.component.as_deref(),
            type_id: draft.issue_type.as_deref(),
            priority_id: draft.priority.as_deref(),
            severity_id: draft.severity.as_deref(),
            status_id: draft.status.as_deref(),
            reported_by: REPORTER_USER_ID,
        };
        let _: Value = self.post("items/", &request).await?;
        Ok(())
    }

    async fn load_projects(&self) -> Result<Vec<FieldOption>> {
        let envelopes: Vec<EntityEnvelope> = self.get("projects/").await?;
        Ok(envelopes
            .into_iter()
            .map(|envelope| envelope.base_entity.into_option())
            .collect())
    }

    fn fields(&self) -> Vec<FieldInfo> {
        self.field_graph().all()
    }

    async fn populate_fields(&self) -> Result<()> {
        let graph = self.field_graph();
        let projects = self.load_projects().await?;
        graph.project.populate(projects);
        Ok(())
    }

    async fn select(&self, field_id: &str, option: FieldOption) -> Result<()> {
        let graph = self.field_graph();
        let Some(field) = graph.find(field_id) else {
            debug!(backend = BACKEND_NAME, field_id, "ignoring selection on unknown field");
            return Ok(());
        };
        let epoch = field.set_value(option.clone());
        if field_id != graph.project.id() {
            return Ok(());
        }

        let components = self.load_components(&option.id).await?;
        graph.component.replace_options(epoch, components);

        // The template id derived from the selected project gates the four
        // sibling metadata fields. No ordering among them.
        let Some(template_id) = option.template_id.as_deref() else {
            return Ok(());
        };
        let (types, priorities, severities, statuses) = tokio::join!(
            self.load_metadata("type", template_id),
            self.load_metadata("priority", template_id),
            self.load_metadata("severity", template_id),
            self.load_metadata("status", template_id),
        );

        let mut first_error = None;
        apply(&graph.issue_type, epoch, types, &mut first_error);
        apply(&graph.priority, epoch, priorities, &mut first_error);
        apply(&graph.severity, epoch, severities, &mut first_error);
        apply(&graph.status, epoch, statuses, &mut first_error);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Applies a metadata fetch outcome to its field, remembering the first
/// failure so sibling successes still land.
fn apply(
    field: &FieldInfo,
    epoch: u64,
    outcome: Result<Vec<FieldOption>>,
    first_error: &mut Option<CommunicatorError>,
) {
    match outcome {
        Ok(options) => {
            field.replace_options(epoch, options);
        }
        Err(err) => {
            if first_error.is_none() {
                *first_error = Some(err);
            }
        }
    }
}

/// Stringifies ids that arrive either as JSON numbers or strings.
fn text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SearchRequest<'a> {
    search_keywords: &'a str,
    include_closed: &'a str,
    projects: &'a str,
    max_items_to_return: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "IssueID", default)]
    issue_id: Option<Value>,
    #[serde(default)]
    issue_key: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    component_name: Option<String>,
}

impl SearchItem {
    /// Name precedence: issue key prefixed to the title, falling back to the
    /// component name when no title is set.
    fn into_result(self) -> SearchResult {
        let id = text(self.id).or_else(|| text(self.issue_id)).unwrap_or_default();
        let title = self
            .title
            .filter(|title| !title.is_empty())
            .or(self.component_name)
            .unwrap_or_default();
        let name = match self.issue_key {
            Some(key) => format!("{} {}", key, title),
            None => title,
        };
        SearchResult { id, name }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommentRequest<'a> {
    project_id: &'a str,
    issue_id: &'a str,
    user_id: &'a str,
    comment: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttachmentRequest<'a> {
    project_id: &'a str,
    issue_id: &'a str,
    name: &'a str,
    content_type: &'a str,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateRequest<'a> {
    title: &'a str,
    description: &'a str,
    project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<&'a str>,
    #[serde(rename = "TypeId", skip_serializing_if = "Option::is_none")]
    type_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_id: Option<&'a str>,
    reported_by: &'a str,
}

/// Listing endpoints wrap each entity in a `BaseEntity` envelope.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EntityEnvelope {
    base_entity: RawEntity,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct RawEntity {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    template_id: Option<Value>,
}

impl RawEntity {
    fn into_option(self) -> FieldOption {
        FieldOption {
            id: text(self.id).unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            template_id: text(self.template_id),
        }
    }
}
