//! Prism Central HTTP client

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ETAG, RETRY_AFTER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::credentials::Credentials;
use super::fetcher::{EndpointCandidate, Fetcher, PageResult, PageSource, QuerySpec, RawReply};
use crate::config::{api, defaults};
use crate::error::{PrismError, Result};

/// TLS and timeout settings shared by every client
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
        }
    }
}

/// Build a reqwest client honouring the TLS policy and request timeout
pub fn build_http_client(settings: &ConnectionSettings) -> Result<Client> {
    let client = Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
        .timeout(settings.timeout)
        .danger_accept_invalid_certs(!settings.verify_tls)
        .build()?;
    Ok(client)
}

/// `host:port`, unless the host already names a port
pub(crate) fn authority(host: &str, default_port: u16) -> String {
    let has_port = host
        .rsplit_once(':')
        .map(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    if has_port {
        host.to_string()
    } else {
        format!("{}:{}", host, default_port)
    }
}

/// Wait requested by a `Retry-After` header, in delta-seconds or HTTP-date form
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    retry_after_at(value, Utc::now())
}

/// A date already in the past means no wait
fn retry_after_at(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        at.with_timezone(&Utc)
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

/// Read status, Retry-After and body without judging the status
pub(crate) async fn read_reply(response: reqwest::Response) -> Result<RawReply> {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await?;
    Ok(RawReply {
        status,
        retry_after,
        body,
    })
}

/// Turn a non-success response into an error, passing successes through
pub(crate) async fn check_response(
    response: reqwest::Response,
    error_context: &str,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    let message = if detail.is_empty() {
        format!("Failed to {}", error_context)
    } else {
        format!("Failed to {}: {}", error_context, detail)
    };
    match status {
        401 | 403 => Err(PrismError::AuthenticationFailed { status, message }),
        _ => Err(PrismError::Api { status, message }),
    }
}

/// Parse a JSON body, naming what was being parsed on failure
pub(crate) async fn parse_json<T>(response: reqwest::Response, error_context: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| PrismError::Json(format!("Failed to parse {}: {}", error_context, e)))
}

/// Send a request and parse its JSON body; an empty body parses as `null`
pub(crate) async fn send_for_json(
    request: reqwest::RequestBuilder,
    error_context: &str,
) -> Result<Value> {
    let response = check_response(request.send().await?, error_context).await?;
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| PrismError::Json(format!("Failed to parse {}: {}", error_context, e)))
}

/// A single object read from whichever API version knows it
#[derive(Debug, Clone)]
pub struct VersionedObject {
    pub endpoint: EndpointCandidate,
    pub body: Value,
    pub etag: Option<String>,
}

/// Prism Central API client using basic authentication
pub struct PrismClient {
    client: Client,
    auth_header: String,
    host: String,
    /// Custom base URL override (for testing with mock servers)
    base_url_override: Option<String>,
}

impl PrismClient {
    pub fn new(credentials: &Credentials, settings: &ConnectionSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(settings)?,
            auth_header: basic_auth(&credentials.username, &credentials.password),
            host: authority(&credentials.host, api::PRISM_PORT),
            base_url_override: None,
        })
    }

    /// Create a client with custom base URL (for testing with mock servers)
    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            auth_header: basic_auth("admin", "secret"),
            host: "mock.prism.local:9440".to_string(),
            base_url_override: Some(base_url.to_string()),
        }
    }

    /// Mock-server client whose requests time out after `timeout`
    #[cfg(test)]
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let settings = ConnectionSettings {
            verify_tls: true,
            timeout,
        };
        Self {
            client: build_http_client(&settings).unwrap(),
            ..Self::with_base_url(base_url)
        }
    }

    /// Build the base URL for API requests
    pub(crate) fn base_url(&self) -> String {
        if let Some(ref url) = self.base_url_override {
            return url.clone();
        }
        format!(
            "https://{}/{}",
            self.host,
            api::BASE_PATH.trim_start_matches('/')
        )
    }

    /// `host:port` this client talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute URL for a path relative to the API base
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    pub(crate) fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.get(url))
    }

    pub(crate) fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.post(url))
    }

    pub(crate) fn put(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.put(url))
    }

    /// GET a single object and parse it
    pub(crate) async fn get_json<T>(&self, path: &str, error_context: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("Fetching {} from: {}", error_context, url);
        let response = check_response(self.get(&url).send().await?, error_context).await?;
        parse_json(response, error_context).await
    }

    /// GET `<candidate path>/<suffix>`, falling back to older versions on 404
    ///
    /// The cached version for `resource` is tried first and a successful
    /// version is cached, like a listing would.
    pub(crate) async fn get_versioned(
        &self,
        fetcher: &Fetcher,
        resource: &str,
        candidates: &[EndpointCandidate],
        suffix: &str,
        error_context: &str,
    ) -> Result<VersionedObject> {
        let mut last_error = None;
        for endpoint in fetcher.preferred_candidates(resource, candidates) {
            let path = format!("{}/{}", endpoint.path, suffix.trim_start_matches('/'));
            match self.get_with_etag(&path, error_context).await {
                Ok((body, etag)) => {
                    fetcher.remember(resource, &endpoint.version);
                    return Ok(VersionedObject {
                        endpoint,
                        body,
                        etag,
                    });
                }
                Err(PrismError::Api { status: 404, message }) => {
                    debug!("{} not found under {}", error_context, endpoint.version);
                    last_error = Some(PrismError::Api {
                        status: 404,
                        message,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            PrismError::Config(format!("No API endpoints configured for {}", resource))
        }))
    }

    /// GET a single object together with its ETag
    pub(crate) async fn get_with_etag(
        &self,
        path: &str,
        error_context: &str,
    ) -> Result<(Value, Option<String>)> {
        let url = self.url(path);
        debug!("Fetching {} from: {}", error_context, url);
        let response = check_response(self.get(&url).send().await?, error_context).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: Value = parse_json(response, error_context).await?;
        Ok((body, etag))
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", username, password).as_bytes())
    )
}

#[derive(Deserialize, Debug, Default)]
struct V4ListResponse {
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    metadata: Option<V4Metadata>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct V4Metadata {
    #[serde(default)]
    total_available_results: Option<u64>,
    #[serde(default)]
    links: Option<Vec<V4Link>>,
}

#[derive(Deserialize, Debug)]
struct V4Link {
    #[serde(default)]
    rel: String,
}

impl V4Metadata {
    /// `Some` only when the response carries pagination links
    fn has_next_link(&self) -> Option<bool> {
        let links = self.links.as_ref()?;
        let paginated = links
            .iter()
            .any(|l| matches!(l.rel.as_str(), "next" | "first" | "last"));
        paginated.then(|| links.iter().any(|l| l.rel == "next"))
    }
}

/// Decode a v4 list body: `data` plus `metadata`
pub(crate) fn decode_v4_page(body: &str) -> Result<PageResult> {
    let response: V4ListResponse = serde_json::from_str(body)
        .map_err(|e| PrismError::Json(format!("Failed to parse list response: {}", e)))?;
    let metadata = response.metadata.unwrap_or_default();
    Ok(PageResult {
        items: response.data.unwrap_or_default(),
        total_available: metadata.total_available_results,
        has_more: metadata.has_next_link(),
    })
}

impl PageSource for PrismClient {
    async fn request_page(
        &self,
        endpoint: &EndpointCandidate,
        query: &QuerySpec,
        page: u32,
    ) -> Result<RawReply> {
        let url = format!("{}?{}", self.url(&endpoint.path), query.odata_query(page));
        debug!("Fetching page {} from: {}", page, url);
        let response = self.get(&url).send().await?;
        read_reply(response).await
    }

    fn decode_page(&self, body: &str) -> Result<PageResult> {
        decode_v4_page(body)
    }
}

/// Page source for v3 `POST <kind>s/list` endpoints (offset/length paging)
pub struct V3Listing<'a> {
    client: &'a PrismClient,
    kind: &'static str,
}

impl<'a> V3Listing<'a> {
    pub fn new(client: &'a PrismClient, kind: &'static str) -> Self {
        Self { client, kind }
    }

    /// Request body for one page
    pub fn request_body(&self, query: &QuerySpec, page: u32) -> Value {
        let mut body = json!({
            "kind": self.kind,
            "length": query.page_size,
            "offset": page * query.page_size,
        });
        if let Some(ref filter) = query.filter {
            body["filter"] = Value::String(filter.clone());
        }
        body
    }
}

#[derive(Deserialize, Debug, Default)]
struct V3ListResponse {
    #[serde(default)]
    entities: Option<Vec<Value>>,
    #[serde(default)]
    metadata: Option<V3Metadata>,
}

#[derive(Deserialize, Debug, Default)]
struct V3Metadata {
    #[serde(default)]
    total_matches: Option<u64>,
}

impl PageSource for V3Listing<'_> {
    async fn request_page(
        &self,
        endpoint: &EndpointCandidate,
        query: &QuerySpec,
        page: u32,
    ) -> Result<RawReply> {
        let url = self.client.url(&endpoint.path);
        debug!("Listing {} page {} from: {}", self.kind, page, url);
        let response = self
            .client
            .post(&url)
            .json(&self.request_body(query, page))
            .send()
            .await?;
        read_reply(response).await
    }

    fn decode_page(&self, body: &str) -> Result<PageResult> {
        let response: V3ListResponse = serde_json::from_str(body)
            .map_err(|e| PrismError::Json(format!("Failed to parse {} list: {}", self.kind, e)))?;
        Ok(PageResult {
            items: response.entities.unwrap_or_default(),
            total_available: response.metadata.and_then(|m| m.total_matches),
            has_more: None,
        })
    }
}

#[cfg(test)]
impl PrismClient {
    /// Create a test client with mock base URL
    pub fn test_client(base_url: &str) -> Self {
        Self::with_base_url(base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn credentials(host: &str) -> Credentials {
        Credentials {
            host: host.to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_base_url() {
        let client =
            PrismClient::new(&credentials("pc.example.com"), &ConnectionSettings::default())
                .unwrap();
        assert_eq!(client.base_url(), "https://pc.example.com:9440/api");
    }

    #[test]
    fn test_base_url_keeps_explicit_port() {
        let client = PrismClient::new(&credentials("10.0.0.5:8443"), &ConnectionSettings::default())
            .unwrap();
        assert_eq!(client.host(), "10.0.0.5:8443");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = PrismClient::test_client("http://127.0.0.1:1234");
        assert_eq!(
            client.url("/iam/v4.0/authz/roles"),
            "http://127.0.0.1:1234/iam/v4.0/authz/roles"
        );
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth("admin", "secret"), "Basic YWRtaW46c2VjcmV0");
    }

    #[test]
    fn test_insecure_client_builds() {
        let settings = ConnectionSettings {
            verify_tls: false,
            timeout: Duration::from_secs(5),
        };
        assert!(build_http_client(&settings).is_ok());
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(12)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:27:30 GMT")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            retry_after_at("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            retry_after_at("Wed, 21 Oct 2015 07:27:00 GMT", now),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_parse_retry_after_past_date_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_decode_v4_page_with_total() {
        let body = r#"{
            "data": [{"extId": "a"}, {"extId": "b"}],
            "metadata": {"totalAvailableResults": 7}
        }"#;
        let page = decode_v4_page(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_available, Some(7));
        assert_eq!(page.has_more, None);
    }

    #[test]
    fn test_decode_v4_page_next_link() {
        let body = r#"{
            "data": [{"extId": "a"}],
            "metadata": {"links": [
                {"href": "https://pc/api?$page=0", "rel": "first"},
                {"href": "https://pc/api?$page=1", "rel": "next"}
            ]}
        }"#;
        assert_eq!(decode_v4_page(body).unwrap().has_more, Some(true));
    }

    #[test]
    fn test_decode_v4_page_last_page_links() {
        let body = r#"{
            "data": [{"extId": "a"}],
            "metadata": {"links": [
                {"href": "https://pc/api?$page=0", "rel": "first"},
                {"href": "https://pc/api?$page=3", "rel": "last"}
            ]}
        }"#;
        assert_eq!(decode_v4_page(body).unwrap().has_more, Some(false));
    }

    #[test]
    fn test_decode_v4_page_self_link_only_is_not_a_signal() {
        let body = r#"{"data": [], "metadata": {"links": [{"href": "x", "rel": "self"}]}}"#;
        assert_eq!(decode_v4_page(body).unwrap().has_more, None);
    }

    #[test]
    fn test_decode_v4_page_null_data() {
        let page = decode_v4_page(r#"{"data": null}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_decode_v4_page_invalid_json() {
        assert!(matches!(
            decode_v4_page("<html>"),
            Err(PrismError::Json(_))
        ));
    }

    #[test]
    fn test_v3_request_body() {
        let client = PrismClient::test_client("http://localhost");
        let listing = V3Listing::new(&client, "vm");
        let query = QuerySpec::new().with_page_size(50);
        let body = listing.request_body(&query, 2);
        assert_eq!(body["kind"], "vm");
        assert_eq!(body["length"], 50);
        assert_eq!(body["offset"], 100);
        assert!(body.get("filter").is_none());
    }

    #[test]
    fn test_v3_decode_page() {
        let client = PrismClient::test_client("http://localhost");
        let listing = V3Listing::new(&client, "vm");
        let page = listing
            .decode_page(r#"{"entities": [{"metadata": {"uuid": "u1"}}], "metadata": {"total_matches": 12}}"#)
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_available, Some(12));
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::prism::fetcher::Fetcher;
    use crate::prism::retry::RetryPolicy;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_requests_carry_basic_auth() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/iam/v4.0/authz/roles/r-1"))
            .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"extId": "r-1"}})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body: Value = client
            .get_json("iam/v4.0/authz/roles/r-1", "fetch role")
            .await
            .unwrap();
        assert_eq!(body["data"]["extId"], "r-1");
    }

    #[tokio::test]
    async fn test_get_with_etag() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/vmm/v4.0/ahv/config/vms/vm-1/guest-tools"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "etag-42")
                    .set_body_json(json!({"data": {"isInstalled": false}})),
            )
            .mount(&mock_server)
            .await;

        let (body, etag) = client
            .get_with_etag("vmm/v4.0/ahv/config/vms/vm-1/guest-tools", "fetch guest tools")
            .await
            .unwrap();
        assert_eq!(etag.as_deref(), Some("etag-42"));
        assert_eq!(body["data"]["isInstalled"], false);
    }

    #[tokio::test]
    async fn test_check_response_maps_auth_errors() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/iam/v4.0/authn/users/u-1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&mock_server)
            .await;

        let err = client
            .get_json::<Value>("iam/v4.0/authn/users/u-1", "fetch user")
            .await
            .unwrap_err();
        match err {
            PrismError::AuthenticationFailed { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("fetch user"));
                assert!(message.contains("forbidden"));
            }
            other => panic!("Expected AuthenticationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_response_maps_other_errors() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = client
            .get_json::<Value>("prism/v4.0/config/tasks/t-1", "fetch task")
            .await
            .unwrap_err();
        assert!(matches!(err, PrismError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_versioned_falls_back_and_caches() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());
        let fetcher = Fetcher::new(RetryPolicy::immediate());
        let candidates =
            EndpointCandidate::from_template(&["v4.1", "v4.0"], "iam/{version}/authz/roles");

        Mock::given(method("GET"))
            .and(path("/iam/v4.1/authz/roles/r-1"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/iam/v4.0/authz/roles/r-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "W/\"7\"")
                    .set_body_json(json!({"data": {"extId": "r-1"}})),
            )
            .expect(2)
            .mount(&mock_server)
            .await;

        let object = client
            .get_versioned(&fetcher, "iam.roles", &candidates, "r-1", "role 'r-1'")
            .await
            .unwrap();
        assert_eq!(object.endpoint.version, "v4.0");
        assert_eq!(object.etag.as_deref(), Some("W/\"7\""));
        assert_eq!(fetcher.resolved_version("iam.roles"), Some("v4.0".to_string()));

        // Second read goes straight to the cached version
        client
            .get_versioned(&fetcher, "iam.roles", &candidates, "r-1", "role 'r-1'")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_for_json_empty_body() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("PUT"))
            .and(path("/nutanix/v3/vms/u-1"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&mock_server)
            .await;

        let body = send_for_json(
            client.put(&client.url("nutanix/v3/vms/u-1")).json(&json!({})),
            "update VM",
        )
        .await
        .unwrap();
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_v3_listing_through_fetcher() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());
        let fetcher = Fetcher::new(RetryPolicy::immediate());

        let entities: Vec<Value> = (0..3)
            .map(|i| json!({"metadata": {"uuid": format!("u{}", i)}}))
            .collect();

        Mock::given(method("POST"))
            .and(path("/nutanix/v3/vms/list"))
            .and(body_partial_json(json!({"kind": "vm", "offset": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": entities[..2].to_vec(),
                "metadata": {"total_matches": 3}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/nutanix/v3/vms/list"))
            .and(body_partial_json(json!({"kind": "vm", "offset": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": entities[2..].to_vec(),
                "metadata": {"total_matches": 3}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let listing = V3Listing::new(&client, "vm");
        let candidates = [EndpointCandidate::new("v3", "nutanix/v3/vms/list")];
        let items = fetcher
            .fetch_all(
                &listing,
                "v3.vms",
                &candidates,
                &QuerySpec::new().with_page_size(2),
            )
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2]["metadata"]["uuid"], "u2");
    }
}
