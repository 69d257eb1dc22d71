//! Move appliance HTTP client with bearer-token login

use log::{debug, info};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::move_api;
use crate::error::{PrismError, Result};
use crate::prism::{
    authority, build_http_client, read_reply, ConnectionSettings, Credentials, EndpointCandidate,
    PageResult, PageSource, QuerySpec, RawReply,
};

#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(rename = "AccessToken", default)]
    access_token: Option<String>,
    #[serde(rename = "APIVersion", default)]
    api_version: Option<String>,
}

/// Move API client authenticated with a bearer token
pub struct MoveClient {
    client: Client,
    base_url: String,
    token: String,
    api_version: Option<String>,
}

impl MoveClient {
    /// Log in to the Move appliance at `credentials.host`
    pub async fn login(credentials: &Credentials, settings: &ConnectionSettings) -> Result<Self> {
        let base_url = format!(
            "https://{}{}",
            authority(&credentials.host, move_api::PORT),
            move_api::BASE_PATH
        );
        Self::login_at(build_http_client(settings)?, base_url, credentials).await
    }

    /// Exchange username and password for an access token
    async fn login_at(client: Client, base_url: String, credentials: &Credentials) -> Result<Self> {
        let url = format!("{}/token", base_url);
        debug!("Requesting Move token from: {}", url);

        let form = format!(
            "grantType=PASSWORD&username={}&password={}",
            urlencoding::encode(&credentials.username),
            urlencoding::encode(&credentials.password)
        );
        let response = client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            let message = format!("Move login failed: {}", body.trim());
            return Err(match status {
                400 | 401 | 403 => PrismError::AuthenticationFailed { status, message },
                _ => PrismError::Api { status, message },
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| PrismError::Json(format!("Failed to parse Move token: {}", e)))?;
        let access_token = token.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            PrismError::AuthenticationFailed {
                status,
                message: "Move login returned no access token".to_string(),
            }
        })?;
        info!(
            "Authenticated to Move API {}",
            token.api_version.as_deref().unwrap_or("(unknown version)")
        );

        Ok(Self {
            client,
            base_url,
            token: access_token,
            api_version: token.api_version,
        })
    }

    /// Create a client with a fixed token (for testing with mock servers)
    #[cfg(test)]
    pub fn test_client(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: "test-token".to_string(),
            api_version: None,
        }
    }

    /// API version reported at login
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Absolute URL for a path relative to `/move/v2`
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    pub(crate) fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.get(url))
    }

    pub(crate) fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.post(url))
    }

    /// POST a JSON body and return the raw reply without judging the status
    pub(crate) async fn post_json(&self, path: &str, body: &Value) -> Result<RawReply> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.post(&url).json(body).send().await?;
        read_reply(response).await
    }
}

/// Error for a Move reply with an unexpected status
pub(crate) fn status_error(reply: &RawReply, error_context: &str) -> PrismError {
    let message = format!("Failed to {}: {}", error_context, reply.body.trim());
    match reply.status {
        401 | 403 => PrismError::AuthenticationFailed {
            status: reply.status,
            message,
        },
        status => PrismError::Api { status, message },
    }
}

/// Turn a Move reply into parsed JSON when its status is accepted
pub(crate) fn expect_status(reply: RawReply, accepted: &[u16], error_context: &str) -> Result<Value> {
    if !accepted.contains(&reply.status) {
        return Err(status_error(&reply, error_context));
    }
    if reply.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&reply.body)
        .map_err(|e| PrismError::Json(format!("Failed to parse {}: {}", error_context, e)))
}

/// Page source for Move `POST .../list` endpoints
///
/// `Limit` and `Offset` are added to a fixed base body; the query filter,
/// if any, is sent as `Query`.
pub struct MoveListing<'a> {
    client: &'a MoveClient,
    base_body: Value,
}

impl<'a> MoveListing<'a> {
    pub fn new(client: &'a MoveClient, base_body: Value) -> Self {
        Self { client, base_body }
    }

    /// Request body for one page
    pub fn request_body(&self, query: &QuerySpec, page: u32) -> Value {
        let mut body = match self.base_body {
            Value::Object(ref map) => Value::Object(map.clone()),
            _ => Value::Object(Default::default()),
        };
        body["Limit"] = Value::from(query.page_size);
        body["Offset"] = Value::from(page * query.page_size);
        if let Some(ref filter) = query.filter {
            body["Query"] = Value::String(filter.clone());
        }
        body
    }
}

#[derive(Deserialize, Debug, Default)]
struct MoveListResponse {
    #[serde(rename = "Entities", default)]
    entities: Option<Vec<Value>>,
    #[serde(rename = "VMs", default)]
    vms: Option<Vec<Value>>,
    #[serde(rename = "Workloads", default)]
    workloads: Option<Vec<Value>>,
    #[serde(rename = "MetaData", default)]
    metadata: Option<MoveListMetadata>,
}

#[derive(Deserialize, Debug, Default)]
struct MoveListMetadata {
    #[serde(rename = "TotalCount", default)]
    total_count: Option<u64>,
    #[serde(rename = "Count", default)]
    count: Option<u64>,
    #[serde(rename = "HasMore", default)]
    has_more: Option<bool>,
}

/// Decode a Move list body; records may sit under `Entities`, `VMs` or `Workloads`
pub(crate) fn decode_move_page(body: &str) -> Result<PageResult> {
    let response: MoveListResponse = serde_json::from_str(body)
        .map_err(|e| PrismError::Json(format!("Failed to parse Move list response: {}", e)))?;
    let items = response
        .entities
        .or(response.vms)
        .or(response.workloads)
        .unwrap_or_default();
    let metadata = response.metadata.unwrap_or_default();
    Ok(PageResult {
        items,
        total_available: metadata.total_count.or(metadata.count),
        has_more: metadata.has_more,
    })
}

impl PageSource for MoveListing<'_> {
    async fn request_page(
        &self,
        endpoint: &EndpointCandidate,
        query: &QuerySpec,
        page: u32,
    ) -> Result<RawReply> {
        let url = self.client.url(&endpoint.path);
        debug!("Fetching Move page {} from: {}", page, url);
        let response = self
            .client
            .post(&url)
            .json(&self.request_body(query, page))
            .send()
            .await?;
        read_reply(response).await
    }

    fn decode_page(&self, body: &str) -> Result<PageResult> {
        decode_move_page(body)
    }
}
