//! IAM API operations

use log::debug;
use reqwest::header::IF_MATCH;
use serde_json::Value;

use super::helpers::{role_create_payload, role_update_payload};
use super::models::{AuthorizationPolicy, Operation, Role, User};
use crate::config::api;
use crate::error::{PrismError, Result};
use crate::prism::client::send_for_json;
use crate::prism::traits::decode_records;
use crate::prism::{EndpointCandidate, Fetcher, PrismClient, QuerySpec};

pub(crate) const ROLES: &str = "iam.roles";
pub(crate) const USERS: &str = "iam.users";
pub(crate) const POLICIES: &str = "iam.authorization-policies";
pub(crate) const OPERATIONS: &str = "iam.operations";

fn candidates(template: &str) -> Vec<EndpointCandidate> {
    EndpointCandidate::from_template(api::IAM_VERSIONS, template)
}

fn roles_candidates() -> Vec<EndpointCandidate> {
    candidates("iam/{version}/authz/roles")
}

impl PrismClient {
    /// Get all IAM roles
    pub async fn list_roles(&self, fetcher: &Fetcher, query: &QuerySpec) -> Result<Vec<Role>> {
        let records = fetcher
            .fetch_all(self, ROLES, &roles_candidates(), query)
            .await?;
        decode_records(records, "roles")
    }

    /// Get all users, optionally narrowed by the query filter
    pub async fn list_users(&self, fetcher: &Fetcher, query: &QuerySpec) -> Result<Vec<User>> {
        let records = fetcher
            .fetch_all(self, USERS, &candidates("iam/{version}/authn/users"), query)
            .await?;
        decode_records(records, "users")
    }

    /// Get all authorization policies
    pub async fn list_authorization_policies(
        &self,
        fetcher: &Fetcher,
        query: &QuerySpec,
    ) -> Result<Vec<AuthorizationPolicy>> {
        let records = fetcher
            .fetch_all(
                self,
                POLICIES,
                &candidates("iam/{version}/authz/authorization-policies"),
                query,
            )
            .await?;
        decode_records(records, "authorization policies")
    }

    /// Get the full operations (permissions) catalogue
    pub async fn list_operations(
        &self,
        fetcher: &Fetcher,
        query: &QuerySpec,
    ) -> Result<Vec<Operation>> {
        let records = fetcher
            .fetch_all(
                self,
                OPERATIONS,
                &candidates("iam/{version}/authz/operations"),
                query,
            )
            .await?;
        decode_records(records, "operations")
    }

    /// Get a role by ExtId with its raw body and ETag
    pub async fn get_role(
        &self,
        fetcher: &Fetcher,
        ext_id: &str,
    ) -> Result<(Role, Value, Option<String>)> {
        let object = self
            .get_versioned(
                fetcher,
                ROLES,
                &roles_candidates(),
                &urlencoding::encode(ext_id),
                &format!("role '{}'", ext_id),
            )
            .await?;
        let data = object.body.get("data").cloned().unwrap_or(Value::Null);
        let role: Role = serde_json::from_value(data.clone())
            .map_err(|e| PrismError::Json(format!("Failed to parse role '{}': {}", ext_id, e)))?;
        Ok((role, data, object.etag))
    }

    /// Create a role; returns the created role
    pub async fn create_role(
        &self,
        fetcher: &Fetcher,
        name: &str,
        description: Option<&str>,
        operations: &[String],
    ) -> Result<Role> {
        let endpoint = self.preferred_endpoint(fetcher, ROLES, &roles_candidates())?;
        let url = self.url(&endpoint.path);
        debug!("Creating role '{}' at {}", name, url);

        let body = send_for_json(
            self.post(&url)
                .json(&role_create_payload(name, description, operations)),
            &format!("create role '{}'", name),
        )
        .await?;
        parse_role_response(body, name)
    }

    /// Replace a role's operations, guarded by its ETag
    pub async fn update_role_operations(
        &self,
        fetcher: &Fetcher,
        ext_id: &str,
        current: &Value,
        etag: Option<&str>,
        operations: &[String],
    ) -> Result<Role> {
        let endpoint = self.preferred_endpoint(fetcher, ROLES, &roles_candidates())?;
        let url = self.url(&format!(
            "{}/{}",
            endpoint.path,
            urlencoding::encode(ext_id)
        ));
        debug!("Updating role {} at {}", ext_id, url);

        let mut request = self
            .put(&url)
            .json(&role_update_payload(current, operations)?);
        if let Some(etag) = etag {
            request = request.header(IF_MATCH, etag);
        }
        let body = send_for_json(request, &format!("update role '{}'", ext_id)).await?;
        parse_role_response(body, ext_id)
    }

    /// Endpoint to write to: the cached version, else the newest
    fn preferred_endpoint(
        &self,
        fetcher: &Fetcher,
        resource: &str,
        candidates: &[EndpointCandidate],
    ) -> Result<EndpointCandidate> {
        fetcher
            .preferred_candidates(resource, candidates)
            .into_iter()
            .next()
            .ok_or_else(|| PrismError::Config(format!("No API endpoints configured for {}", resource)))
    }
}

fn parse_role_response(body: Value, what: &str) -> Result<Role> {
    match body.get("data") {
        Some(data) if data.is_object() => serde_json::from_value(data.clone())
            .map_err(|e| PrismError::Json(format!("Failed to parse role '{}': {}", what, e))),
        _ => Err(PrismError::Json(format!(
            "Response for role '{}' carries no role data",
            what
        ))),
    }
}
