use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::config::Config;
use crate::notion::model::RetrieveDatabaseResp;

pub mod model;

const NOTION_API_BASE: &str = "https://api.notion.com/";

pub const PUBLISHED_PROPERTY: &str = "Published";
pub const READY_PROPERTY: &str = "Ready";
pub const UPDATED_PROPERTY: &str = "Updated";

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Query capability of a Notion database. Returns the response body as-is;
/// decoding into `model::QueryResponse` is left to the caller.
#[async_trait]
pub trait DatabaseQuery: Send + Sync {
    async fn query_database(&self, database_id: &str, request: &QueryRequest) -> Result<Value>;
}

/// Page update capability. `body` is the full JSON request body.
#[async_trait]
pub trait PageUpdate: Send + Sync {
    async fn update_page(&self, page_id: &str, body: &Value) -> Result<()>;
}

/// Body of a database query: one filter plus sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub filter: Filter,
    pub sorts: Vec<Sort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    And {
        and: Vec<Filter>,
    },
    Checkbox {
        property: String,
        checkbox: CheckboxCondition,
    },
}

impl Filter {
    pub fn checkbox(property: &str, condition: CheckboxCondition) -> Self {
        Filter::Checkbox {
            property: property.to_string(),
            checkbox: condition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxCondition {
    Equals(bool),
    DoesNotEqual(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timestamp {
    CreatedTime,
    LastEditedTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Unpublished articles that are marked ready, most recently edited first.
pub fn build_ready_articles_query() -> QueryRequest {
    QueryRequest {
        filter: Filter::And {
            and: vec![
                Filter::checkbox(PUBLISHED_PROPERTY, CheckboxCondition::Equals(false)),
                Filter::checkbox(READY_PROPERTY, CheckboxCondition::Equals(true)),
            ],
        },
        sorts: vec![Sort {
            property: Some(UPDATED_PROPERTY.to_string()),
            timestamp: Some(Timestamp::LastEditedTime),
            direction: Direction::Descending,
        }],
    }
}

/// Body that flips the Published checkbox on. The property id is sent along
/// when known.
pub fn build_mark_published_request(published_property_id: Option<&str>) -> Value {
    let mut published = Map::new();
    if let Some(id) = published_property_id {
        published.insert("id".into(), json!(id));
    }
    published.insert("checkbox".into(), json!(true));

    let mut properties = Map::new();
    properties.insert(PUBLISHED_PROPERTY.to_string(), Value::Object(published));

    json!({ "properties": Value::Object(properties) })
}

impl NotionClient {
    pub fn new(token: String, version: String) -> Result<Self> {
        let base_url = Url::parse(NOTION_API_BASE).context("invalid default Notion URL")?;
        Self::with_base_url(token, version, base_url)
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.notion.token.clone(), cfg.notion.version.clone())
    }

    pub fn with_base_url(token: String, version: String, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("article-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
            version,
        })
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(path)
            .context("invalid Notion base URL")?;
        let mut builder = self
            .http
            .request(method, endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version);
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .json(body);
        }
        builder.build().context("failed to build Notion request")
    }

    async fn execute(&self, request: reqwest::Request) -> Result<String> {
        debug!(method=%request.method(), url=%request.url(), "sending notion request");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Notion")?;

        let status = res.status();
        let body = res.text().await;
        if !status.is_success() {
            let body = body.unwrap_or_default();
            warn!("Notion API error - Status: {}, Body: {}", status, body);
            return check_status(status, body);
        }
        let body = body.context("failed to read Notion response")?;
        check_status(status, body)
    }

    pub async fn query_database(&self, database_id: &str, query: &QueryRequest) -> Result<Value> {
        let body = serde_json::to_value(query).context("failed to encode Notion query")?;
        let request = self.build_request(
            Method::POST,
            &format!("v1/databases/{}/query", database_id),
            Some(&body),
        )?;
        let text = self.execute(request).await?;
        serde_json::from_str(&text).context("invalid Notion query response JSON")
    }

    pub async fn update_page(&self, page_id: &str, body: &Value) -> Result<()> {
        let request =
            self.build_request(Method::PATCH, &format!("v1/pages/{}", page_id), Some(body))?;
        let text = self.execute(request).await?;
        let payload: UpdatePageResponse =
            serde_json::from_str(&text).context("invalid Notion update response JSON")?;
        debug!(page_id = %payload.id, "updated notion page");
        Ok(())
    }

    pub async fn retrieve_database(&self, database_id: &str) -> Result<RetrieveDatabaseResp> {
        let request =
            self.build_request(Method::GET, &format!("v1/databases/{}", database_id), None)?;
        let text = self.execute(request).await?;
        serde_json::from_str(&text).context("invalid Notion database response JSON")
    }
}

#[async_trait]
impl DatabaseQuery for NotionClient {
    async fn query_database(&self, database_id: &str, request: &QueryRequest) -> Result<Value> {
        NotionClient::query_database(self, database_id, request).await
    }
}

#[async_trait]
impl PageUpdate for NotionClient {
    async fn update_page(&self, page_id: &str, body: &Value) -> Result<()> {
        NotionClient::update_page(self, page_id, body).await
    }
}

/// Map a Notion response status to the body on success, or to an error
/// carrying status and body.
pub fn check_status(status: StatusCode, body: String) -> Result<String> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(anyhow!("received 429 from Notion: {}", body));
    }
    if !status.is_success() {
        return Err(anyhow!("notion error {}: {}", status, body));
    }
    Ok(body)
}

#[derive(Deserialize)]
struct UpdatePageResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_status_passes_body_on_success() {
        let body = check_status(StatusCode::OK, "{\"id\":\"p\"}".into()).unwrap();
        assert_eq!(body, "{\"id\":\"p\"}");
    }

    #[test]
    fn check_status_reports_rate_limit() {
        let err = check_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()).unwrap_err();
        assert_eq!(err.to_string(), "received 429 from Notion: slow down");
    }

    #[test]
    fn check_status_reports_client_and_server_errors() {
        let err = check_status(StatusCode::UNAUTHORIZED, "bad token".into()).unwrap_err();
        assert_eq!(err.to_string(), "notion error 401 Unauthorized: bad token");

        let err = check_status(StatusCode::BAD_GATEWAY, "".into()).unwrap_err();
        assert!(err.to_string().starts_with("notion error 502 Bad Gateway"));
    }

    #[test]
    fn ready_articles_query_serializes_to_notion_shape() {
        let body = serde_json::to_value(build_ready_articles_query()).unwrap();
        assert_eq!(
            body,
            json!({
                "filter": {
                    "and": [
                        { "property": "Published", "checkbox": { "equals": false } },
                        { "property": "Ready", "checkbox": { "equals": true } }
                    ]
                },
                "sorts": [
                    {
                        "property": "Updated",
                        "timestamp": "last_edited_time",
                        "direction": "descending"
                    }
                ]
            })
        );
    }

    #[test]
    fn does_not_equal_condition_name() {
        let filter = Filter::checkbox("Published", CheckboxCondition::DoesNotEqual(true));
        assert_eq!(
            serde_json::to_value(filter).unwrap(),
            json!({ "property": "Published", "checkbox": { "does_not_equal": true } })
        );
    }

    #[test]
    fn mark_published_request_with_property_id() {
        let body = build_mark_published_request(Some("pub-id"));
        assert_eq!(
            body,
            json!({ "properties": { "Published": { "id": "pub-id", "checkbox": true } } })
        );
    }

    #[test]
    fn mark_published_request_without_property_id() {
        let body = build_mark_published_request(None);
        assert_eq!(body["properties"]["Published"]["checkbox"], true);
        assert!(body["properties"]["Published"].get("id").is_none());
    }

    #[test]
    fn build_request_sets_headers() {
        let client = NotionClient::new("token".into(), "2022-06-28".into()).unwrap();
        let body = json!({ "sample": true });
        let request = client
            .build_request(Method::POST, "v1/databases/db-1/query", Some(&body))
            .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), "/v1/databases/db-1/query");
        let headers = request.headers();
        assert_eq!(
            headers
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "Bearer token"
        );
        assert_eq!(
            headers
                .get("Notion-Version")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "2022-06-28"
        );
        assert_eq!(
            headers
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
    }

    #[test]
    fn build_request_without_body_has_no_content_type() {
        let client = NotionClient::new("token".into(), "2022-06-28".into()).unwrap();
        let request = client
            .build_request(Method::GET, "v1/databases/db-1", None)
            .unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().path(), "/v1/databases/db-1");
        assert!(request.headers().get("Content-Type").is_none());
    }
}
