//! Paginated resource fetcher with API version fallback
//!
//! Every "list all X" operation goes through [`Fetcher::fetch_all`]. The
//! fetcher walks an ordered list of endpoint candidates (newest API version
//! first), falls back to the next candidate only on HTTP 404, and then pages
//! through the resolved endpoint strictly in sequence. Rate limiting and
//! transient failures are retried according to the injected [`RetryPolicy`].
//!
//! The version that answered first is remembered per resource type for the
//! lifetime of the `Fetcher`, so repeated listings skip probing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;

use super::retry::RetryPolicy;
use crate::config::api;
use crate::error::{PrismError, Result};

/// One API version of a resource endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    /// Version tag, e.g. `v4.1`
    pub version: String,
    /// Path relative to the API base, e.g. `vmm/v4.1/ahv/config/vms`
    pub path: String,
}

impl EndpointCandidate {
    pub fn new(version: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
        }
    }

    /// Build candidates from a path template containing `{version}`
    pub fn from_template(versions: &[&str], template: &str) -> Vec<Self> {
        versions
            .iter()
            .map(|v| Self::new(*v, template.replace(api::VERSION_PLACEHOLDER, v)))
            .collect()
    }
}

/// Sort direction for `$orderby`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Field and direction for `$orderby`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `"field"`, `"field asc"` or `"field desc"`
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| PrismError::InvalidQuery("order-by field is empty".to_string()))?;

        let direction = match parts.next().map(|d| d.to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(other) => {
                return Err(PrismError::InvalidQuery(format!(
                    "unknown sort direction '{}' (expected asc or desc)",
                    other
                )))
            }
        };

        if parts.next().is_some() {
            return Err(PrismError::InvalidQuery(format!(
                "order-by must be '<field> [asc|desc]', got '{}'",
                input
            )));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }

    /// Render as an OData `$orderby` value
    pub fn to_odata(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("{} desc", self.field),
        }
    }
}

/// What to list and how many records per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// OData predicate, passed to the server untouched
    pub filter: Option<String>,
    pub select: Vec<String>,
    pub order_by: Option<OrderBy>,
    pub page_size: u32,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filter: None,
            select: Vec::new(),
            order_by: None,
            page_size: api::DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// AND a clause onto the current filter, or set it when there is none
    pub fn and_filter(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        self.filter = match self.filter.take() {
            Some(existing) if !existing.trim().is_empty() => {
                Some(format!("({}) and {}", existing.trim(), clause))
            }
            _ => Some(clause),
        };
        self
    }

    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reject specs the server would never accept
    pub fn validate(&self) -> Result<()> {
        if !(1..=api::MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(PrismError::InvalidQuery(format!(
                "page size must be between 1 and {}, got {}",
                api::MAX_PAGE_SIZE,
                self.page_size
            )));
        }
        if matches!(&self.filter, Some(f) if f.trim().is_empty()) {
            return Err(PrismError::InvalidQuery("filter is empty".to_string()));
        }
        Ok(())
    }

    /// OData query string for one page (0-based)
    pub fn odata_query(&self, page: u32) -> String {
        let mut query = format!("$page={}&$limit={}", page, self.page_size);
        if let Some(ref filter) = self.filter {
            query.push_str(&format!("&$filter={}", urlencoding::encode(filter)));
        }
        if !self.select.is_empty() {
            query.push_str(&format!(
                "&$select={}",
                urlencoding::encode(&self.select.join(","))
            ));
        }
        if let Some(ref order_by) = self.order_by {
            query.push_str(&format!(
                "&$orderby={}",
                urlencoding::encode(&order_by.to_odata())
            ));
        }
        query
    }
}

/// Records and continuation hints decoded from one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub items: Vec<Value>,
    pub total_available: Option<u64>,
    /// Explicit continuation flag, when the API provides one
    pub has_more: Option<bool>,
}

/// Undecoded HTTP response for one page request
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: String,
}

/// An authenticated API that can serve one page of a listing
///
/// Implementations issue exactly one HTTP request per call and never retry;
/// retries belong to the [`Fetcher`].
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn request_page(
        &self,
        endpoint: &EndpointCandidate,
        query: &QuerySpec,
        page: u32,
    ) -> Result<RawReply>;

    fn decode_page(&self, body: &str) -> Result<PageResult>;
}

/// Decide whether another page should be requested
///
/// `accumulated` already includes the records of `page`.
pub fn has_more_pages(page: &PageResult, accumulated: usize, page_size: u32) -> bool {
    if page.items.is_empty() {
        return false;
    }
    if let Some(flag) = page.has_more {
        return flag;
    }
    if page.items.len() < page_size as usize {
        return false;
    }
    // A full page continues unless the reported total is already reached
    match page.total_available {
        Some(total) => (accumulated as u64) < total,
        None => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    ResolvingVersion,
    Fetching,
    Succeeded,
    Failed,
}

/// Per-listing state; discarded when `fetch_all` returns
struct FetchSession {
    resource: String,
    state: SessionState,
    backing_off: bool,
    page: u32,
    items: Vec<Value>,
}

impl FetchSession {
    fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            state: SessionState::ResolvingVersion,
            backing_off: false,
            page: 0,
            items: Vec::new(),
        }
    }

    fn enter(&mut self, next: SessionState) {
        if self.state != next {
            debug!("{}: {:?} -> {:?}", self.resource, self.state, next);
            self.state = next;
        }
    }

    fn back_off(&mut self) {
        if !self.backing_off {
            debug!("{}: backing off on page {}", self.resource, self.page);
        }
        self.backing_off = true;
    }

    fn resume(&mut self) {
        self.backing_off = false;
    }
}

enum PageOutcome {
    Page(PageResult),
    NotFound,
}

/// Long-lived fetcher; one per program run
pub struct Fetcher {
    policy: RetryPolicy,
    resolved: RwLock<HashMap<String, String>>,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Fetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Version tag that answered for `resource` earlier in this run
    pub fn resolved_version(&self, resource: &str) -> Option<String> {
        self.resolved
            .read()
            .ok()
            .and_then(|cache| cache.get(resource).cloned())
    }

    /// Forget every resolved version
    pub fn reset_cache(&self) {
        if let Ok(mut cache) = self.resolved.write() {
            cache.clear();
        }
    }

    /// Candidates with the cached version, if any, moved to the front
    pub fn preferred_candidates(
        &self,
        resource: &str,
        candidates: &[EndpointCandidate],
    ) -> Vec<EndpointCandidate> {
        let mut ordered = candidates.to_vec();
        if let Some(version) = self.resolved_version(resource) {
            if let Some(pos) = ordered.iter().position(|c| c.version == version) {
                let cached = ordered.remove(pos);
                ordered.insert(0, cached);
            }
        }
        ordered
    }

    pub(crate) fn remember(&self, resource: &str, version: &str) {
        if let Ok(mut cache) = self.resolved.write() {
            cache.insert(resource.to_string(), version.to_string());
        }
    }

    /// Fetch every record of `resource` in server order
    ///
    /// # Arguments
    /// * `source` - Authenticated API serving single pages
    /// * `resource` - Cache key for the resolved version, e.g. `vmm.vms`
    /// * `candidates` - Endpoint versions, newest first
    /// * `query` - Filter, select, order-by and page size
    pub async fn fetch_all<S: PageSource>(
        &self,
        source: &S,
        resource: &str,
        candidates: &[EndpointCandidate],
        query: &QuerySpec,
    ) -> Result<Vec<Value>> {
        query.validate()?;
        if candidates.is_empty() {
            return Err(PrismError::Config(format!(
                "No API endpoints configured for {}",
                resource
            )));
        }

        let mut session = FetchSession::new(resource);
        match self
            .run_session(source, &mut session, candidates, query)
            .await
        {
            Ok(()) => {
                session.enter(SessionState::Succeeded);
                debug!(
                    "Fetched {} records for {} in {} page(s)",
                    session.items.len(),
                    resource,
                    session.page + 1
                );
                Ok(session.items)
            }
            Err(e) => {
                session.enter(SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn run_session<S: PageSource>(
        &self,
        source: &S,
        session: &mut FetchSession,
        candidates: &[EndpointCandidate],
        query: &QuerySpec,
    ) -> Result<()> {
        let (endpoint, mut result) = self
            .resolve_endpoint(source, session, candidates, query)
            .await?;
        session.enter(SessionState::Fetching);

        loop {
            let accumulated = session.items.len() + result.items.len();
            let more = has_more_pages(&result, accumulated, query.page_size);
            debug!(
                "{} page {}: {} records (accumulated {})",
                session.resource,
                session.page,
                result.items.len(),
                accumulated
            );
            session.items.extend(result.items);

            if !more {
                return Ok(());
            }

            session.page += 1;
            if !self.policy.page_pause.is_zero() {
                tokio::time::sleep(self.policy.page_pause).await;
            }

            result = match self.fetch_page(source, session, &endpoint, query).await? {
                PageOutcome::Page(page) => page,
                PageOutcome::NotFound => {
                    return Err(PrismError::Api {
                        status: 404,
                        message: format!(
                            "{} page {} not found at {}",
                            session.resource, session.page, endpoint.path
                        ),
                    })
                }
            };
        }
    }

    /// Find the endpoint to use and return its first page
    async fn resolve_endpoint<S: PageSource>(
        &self,
        source: &S,
        session: &mut FetchSession,
        candidates: &[EndpointCandidate],
        query: &QuerySpec,
    ) -> Result<(EndpointCandidate, PageResult)> {
        if let Some(version) = self.resolved_version(&session.resource) {
            if let Some(candidate) = candidates.iter().find(|c| c.version == version) {
                debug!("Using cached API {} for {}", version, session.resource);
                session.enter(SessionState::Fetching);
                return match self.fetch_page(source, session, candidate, query).await? {
                    PageOutcome::Page(page) => Ok((candidate.clone(), page)),
                    PageOutcome::NotFound => Err(PrismError::Api {
                        status: 404,
                        message: format!(
                            "{} no longer answers at {}",
                            session.resource, candidate.path
                        ),
                    }),
                };
            }
        }

        let mut tried = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            debug!("Probing {} for {}", candidate.path, session.resource);
            tried.push(candidate.version.clone());

            match self.fetch_page(source, session, candidate, query).await? {
                PageOutcome::Page(page) => {
                    info!("Using API {} for {}", candidate.version, session.resource);
                    self.remember(&session.resource, &candidate.version);
                    return Ok((candidate.clone(), page));
                }
                PageOutcome::NotFound => {
                    info!(
                        "API {} not available for {} (HTTP 404), trying next version",
                        candidate.version, session.resource
                    );
                }
            }
        }

        Err(PrismError::NoCompatibleEndpoint {
            resource: session.resource.clone(),
            tried,
        })
    }

    /// Request the session's current page until it succeeds or fails for good
    async fn fetch_page<S: PageSource>(
        &self,
        source: &S,
        session: &mut FetchSession,
        endpoint: &EndpointCandidate,
        query: &QuerySpec,
    ) -> Result<PageOutcome> {
        let mut rate_limited = 0u32;
        let mut transient = 0u32;

        loop {
            let reply = match source.request_page(endpoint, query, session.page).await {
                Ok(reply) => reply,
                Err(PrismError::Http(e)) => {
                    self.back_off_transient(session, &mut transient, e.to_string())
                        .await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match reply.status {
                200..=299 => {
                    session.resume();
                    return Ok(PageOutcome::Page(source.decode_page(&reply.body)?));
                }
                404 => {
                    session.resume();
                    return Ok(PageOutcome::NotFound);
                }
                429 => {
                    if rate_limited >= self.policy.max_rate_limit_retries {
                        return Err(PrismError::RateLimitExceeded {
                            resource: session.resource.clone(),
                            retries: rate_limited,
                        });
                    }
                    rate_limited += 1;
                    let wait = self.policy.rate_limit_wait(reply.retry_after);
                    warn!(
                        "Rate limited on {} page {} (retry {}/{}), waiting {:?}",
                        session.resource,
                        session.page,
                        rate_limited,
                        self.policy.max_rate_limit_retries,
                        wait
                    );
                    session.back_off();
                    tokio::time::sleep(wait).await;
                }
                status @ (401 | 403) => {
                    return Err(PrismError::AuthenticationFailed {
                        status,
                        message: response_message(&reply.body),
                    })
                }
                400 | 422 => {
                    return Err(PrismError::InvalidQuery(response_message(&reply.body)));
                }
                status @ (408 | 500..=599) => {
                    let message = format!("HTTP {}: {}", status, response_message(&reply.body));
                    self.back_off_transient(session, &mut transient, message)
                        .await?;
                }
                status => {
                    return Err(PrismError::Api {
                        status,
                        message: response_message(&reply.body),
                    })
                }
            }
        }
    }

    async fn back_off_transient(
        &self,
        session: &mut FetchSession,
        attempt: &mut u32,
        message: String,
    ) -> Result<()> {
        if *attempt >= self.policy.max_transient_retries {
            return Err(PrismError::TransientFetchFailure {
                resource: session.resource.clone(),
                attempts: *attempt + 1,
                message,
            });
        }
        let delay = self.policy.backoff_delay(*attempt);
        *attempt += 1;
        warn!(
            "Request for {} page {} failed (attempt {}/{}): {}; retrying in {:?}",
            session.resource,
            session.page,
            attempt,
            self.policy.max_transient_retries + 1,
            message,
            delay
        );
        session.back_off();
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

fn response_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response)".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidates_from_template() {
        let candidates =
            EndpointCandidate::from_template(&["v4.1", "v4.0"], "vmm/{version}/ahv/config/vms");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].version, "v4.1");
        assert_eq!(candidates[0].path, "vmm/v4.1/ahv/config/vms");
        assert_eq!(candidates[1].path, "vmm/v4.0/ahv/config/vms");
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("name").unwrap(), OrderBy::asc("name"));
        assert_eq!(OrderBy::parse("name DESC").unwrap(), OrderBy::desc("name"));
        assert_eq!(OrderBy::parse("  name   asc ").unwrap(), OrderBy::asc("name"));
        assert!(OrderBy::parse("").is_err());
        assert!(OrderBy::parse("name sideways").is_err());
        assert!(OrderBy::parse("name desc extra").is_err());
    }

    #[test]
    fn test_order_by_to_odata() {
        assert_eq!(OrderBy::asc("name").to_odata(), "name");
        assert_eq!(OrderBy::desc("createTime").to_odata(), "createTime desc");
    }

    #[test]
    fn test_query_spec_validate_page_size() {
        assert!(QuerySpec::new().validate().is_ok());
        assert!(QuerySpec::new().with_page_size(1).validate().is_ok());
        assert!(QuerySpec::new().with_page_size(100).validate().is_ok());

        for size in [0, 101, 500] {
            let err = QuerySpec::new().with_page_size(size).validate().unwrap_err();
            assert!(matches!(err, PrismError::InvalidQuery(_)));
        }
    }

    #[test]
    fn test_query_spec_rejects_blank_filter() {
        let err = QuerySpec::new().with_filter("  ").validate().unwrap_err();
        assert!(matches!(err, PrismError::InvalidQuery(_)));
    }

    #[test]
    fn test_and_filter_keeps_existing_clause() {
        let query = QuerySpec::new().and_filter("key eq 'Env'");
        assert_eq!(query.filter.as_deref(), Some("key eq 'Env'"));

        let query = QuerySpec::new()
            .with_filter("value eq 'Prod'")
            .and_filter("key eq 'Env'");
        assert_eq!(query.filter.as_deref(), Some("(value eq 'Prod') and key eq 'Env'"));
    }

    #[test]
    fn test_odata_query_minimal() {
        let query = QuerySpec::new().with_page_size(25);
        assert_eq!(query.odata_query(3), "$page=3&$limit=25");
    }

    #[test]
    fn test_odata_query_encodes_parameters() {
        let query = QuerySpec::new()
            .with_filter("name eq 'web 01'")
            .with_select(["name", "extId"])
            .with_order_by(OrderBy::desc("name"));
        let rendered = query.odata_query(0);
        assert!(rendered.starts_with("$page=0&$limit=100"));
        assert!(rendered.contains("&$filter=name%20eq%20%27web%2001%27"));
        assert!(rendered.contains("&$select=name%2CextId"));
        assert!(rendered.contains("&$orderby=name%20desc"));
    }

    fn page(count: usize) -> PageResult {
        PageResult {
            items: (0..count).map(|i| json!({ "i": i })).collect(),
            ..PageResult::default()
        }
    }

    #[test]
    fn test_has_more_short_page_heuristic() {
        assert!(has_more_pages(&page(100), 100, 100));
        assert!(!has_more_pages(&page(50), 250, 100));
    }

    #[test]
    fn test_has_more_empty_page_always_stops() {
        let mut empty = page(0);
        empty.has_more = Some(true);
        assert!(!has_more_pages(&empty, 0, 100));
    }

    #[test]
    fn test_has_more_explicit_flag_wins() {
        let mut short = page(10);
        short.has_more = Some(true);
        assert!(has_more_pages(&short, 10, 100));

        let mut full = page(100);
        full.has_more = Some(false);
        full.total_available = Some(1000);
        assert!(!has_more_pages(&full, 100, 100));
    }

    #[test]
    fn test_has_more_total_stops_full_page_early() {
        let mut full = page(100);
        full.total_available = Some(100);
        assert!(!has_more_pages(&full, 100, 100));

        full.total_available = Some(250);
        assert!(has_more_pages(&full, 100, 100));
    }

    #[test]
    fn test_has_more_short_page_stops_despite_total() {
        let mut short = page(10);
        short.total_available = Some(30);
        assert!(!has_more_pages(&short, 10, 100));
    }

    #[test]
    fn test_preferred_candidates_puts_cached_first() {
        let fetcher = Fetcher::new(RetryPolicy::immediate());
        let candidates =
            EndpointCandidate::from_template(&["v4.1", "v4.1.b2", "v4.0"], "iam/{version}/authz/roles");
        assert_eq!(fetcher.preferred_candidates("iam.roles", &candidates), candidates);

        fetcher.remember("iam.roles", "v4.0");
        let ordered = fetcher.preferred_candidates("iam.roles", &candidates);
        assert_eq!(ordered[0].version, "v4.0");
        assert_eq!(ordered[1].version, "v4.1");
        assert_eq!(ordered.len(), 3);
    }

    #[test]
    fn test_reset_cache() {
        let fetcher = Fetcher::new(RetryPolicy::immediate());
        fetcher.remember("vmm.vms", "v4.0");
        assert_eq!(fetcher.resolved_version("vmm.vms"), Some("v4.0".to_string()));
        fetcher.reset_cache();
        assert_eq!(fetcher.resolved_version("vmm.vms"), None);
    }
}
