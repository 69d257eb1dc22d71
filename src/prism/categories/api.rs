//! Subnet, category and v3 VM category assignment API operations

use std::collections::BTreeSet;

use log::{debug, info};
use serde_json::Value;

use super::models::{attached_to_subnet, Category, CategoryAssignment, Subnet, V3Vm};
use crate::config::api;
use crate::error::{PrismError, Result};
use crate::prism::client::read_reply;
use crate::prism::traits::decode_records;
use crate::prism::vms::{v3_vms_candidates, V3_VMS};
use crate::prism::{EndpointCandidate, Fetcher, PrismClient, QuerySpec, V3Listing};

pub(crate) const SUBNETS: &str = "networking.subnets";
pub(crate) const CATEGORIES: &str = "prism.categories";

fn subnets_candidates() -> Vec<EndpointCandidate> {
    EndpointCandidate::from_template(api::NETWORKING_VERSIONS, "networking/{version}/config/subnets")
}

fn categories_candidates() -> Vec<EndpointCandidate> {
    EndpointCandidate::from_template(api::PRISM_VERSIONS, "prism/{version}/config/categories")
}

/// Unique category keys, sorted
pub fn category_keys(categories: &[Category]) -> Vec<String> {
    categories
        .iter()
        .filter(|c| !c.key.is_empty())
        .map(|c| c.key.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl PrismClient {
    /// Get all subnets
    pub async fn list_subnets(&self, fetcher: &Fetcher, query: &QuerySpec) -> Result<Vec<Subnet>> {
        let records = fetcher
            .fetch_all(self, SUBNETS, &subnets_candidates(), query)
            .await?;
        decode_records(records, "subnets")
    }

    /// Get all category key/value pairs
    pub async fn list_categories(
        &self,
        fetcher: &Fetcher,
        query: &QuerySpec,
    ) -> Result<Vec<Category>> {
        let records = fetcher
            .fetch_all(self, CATEGORIES, &categories_candidates(), query)
            .await?;
        decode_records(records, "categories")
    }

    /// Get the values defined for one category key
    ///
    /// A filter already on `query` is kept and ANDed with the key match.
    pub async fn list_category_values(
        &self,
        fetcher: &Fetcher,
        key: &str,
        query: &QuerySpec,
    ) -> Result<Vec<Category>> {
        let query = query
            .clone()
            .and_filter(format!("key eq '{}'", key.replace('\'', "''")));
        self.list_categories(fetcher, &query).await
    }

    /// Get the VMs with at least one NIC on the subnet
    pub async fn list_subnet_vms(&self, fetcher: &Fetcher, subnet_uuid: &str) -> Result<Vec<V3Vm>> {
        let listing = V3Listing::new(self, "vm");
        let entities = fetcher
            .fetch_all(&listing, V3_VMS, &v3_vms_candidates(), &QuerySpec::new())
            .await?;
        let total = entities.len();
        let vms: Vec<V3Vm> = entities
            .iter()
            .filter(|entity| attached_to_subnet(entity, subnet_uuid))
            .map(V3Vm::from_entity)
            .collect();
        debug!("{} of {} VMs are attached to subnet {}", vms.len(), total, subnet_uuid);
        Ok(vms)
    }

    /// Set one category on a VM through the v3 API
    ///
    /// The full VM document is read, the category merged into
    /// `metadata.categories`, `status` dropped, and the document written back.
    pub async fn assign_category(&self, vm_uuid: &str, category: &CategoryAssignment) -> Result<()> {
        let path = format!("{}/{}", api::V3_VMS_PATH, urlencoding::encode(vm_uuid));
        let mut document: Value = self
            .get_json(&path, &format!("read VM {}", vm_uuid))
            .await?;
        let document_object = document.as_object_mut().ok_or_else(|| {
            PrismError::Json(format!("VM {} document is not an object", vm_uuid))
        })?;
        document_object.remove("status");

        let metadata = document_object
            .entry("metadata")
            .or_insert_with(|| Value::Object(Default::default()));
        let categories = metadata
            .as_object_mut()
            .ok_or_else(|| PrismError::Json(format!("VM {} metadata is not an object", vm_uuid)))?
            .entry("categories")
            .or_insert_with(|| Value::Object(Default::default()));
        match categories.as_object_mut() {
            Some(map) => {
                map.insert(category.key.clone(), Value::String(category.value.clone()));
            }
            None => {
                return Err(PrismError::Json(format!(
                    "VM {} categories are not an object",
                    vm_uuid
                )))
            }
        }

        let url = self.url(&path);
        debug!("Assigning {} to VM {} at {}", category, vm_uuid, url);
        let reply = read_reply(self.put(&url).json(&document).send().await?).await?;
        match reply.status {
            200 | 202 => {
                info!("Assigned {} to VM {}", category, vm_uuid);
                Ok(())
            }
            401 | 403 => Err(PrismError::AuthenticationFailed {
                status: reply.status,
                message: format!("Not allowed to update VM {}", vm_uuid),
            }),
            status => Err(PrismError::Api {
                status,
                message: format!(
                    "Failed to update VM {}: {}",
                    vm_uuid,
                    reply.body.trim().chars().take(200).collect::<String>()
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prism::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(RetryPolicy::immediate())
    }

    fn category(key: &str, value: &str) -> Category {
        Category {
            key: key.to_string(),
            value: value.to_string(),
            ..Category::default()
        }
    }

    #[test]
    fn test_category_keys_unique_sorted() {
        let categories = vec![
            category("Env", "Prod"),
            category("AppType", "Web"),
            category("Env", "Dev"),
            category("", "orphan"),
        ];
        assert_eq!(category_keys(&categories), vec!["AppType", "Env"]);
    }

    #[tokio::test]
    async fn test_list_subnets_falls_back() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());
        let fetcher = fetcher();

        Mock::given(method("GET"))
            .and(path("/networking/v4.2/config/subnets"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/networking/v4.0/config/subnets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"extId": "s-1", "name": "vlan10", "subnetType": "VLAN"}],
                "metadata": {"totalAvailableResults": 1}
            })))
            .mount(&mock_server)
            .await;

        let subnets = client.list_subnets(&fetcher, &QuerySpec::new()).await.unwrap();
        assert_eq!(subnets.len(), 1);
        assert_eq!(subnets[0].subnet_type(), "VLAN");
        assert_eq!(fetcher.resolved_version(SUBNETS).as_deref(), Some("v4.0"));
    }

    #[tokio::test]
    async fn test_list_category_values_filters_by_key() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/prism/v4.2/config/categories"))
            .and(query_param("$filter", "key eq 'Env'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"extId": "c-1", "key": "Env", "value": "Prod"},
                    {"extId": "c-2", "key": "Env", "value": "Dev"}
                ],
                "metadata": {"totalAvailableResults": 2}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let values = client
            .list_category_values(&fetcher(), "Env", &QuerySpec::new())
            .await
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].value, "Dev");
    }

    #[tokio::test]
    async fn test_list_category_values_keeps_caller_filter() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/prism/v4.2/config/categories"))
            .and(query_param("$filter", "(value eq 'Prod') and key eq 'Env'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"extId": "c-1", "key": "Env", "value": "Prod"}],
                "metadata": {"totalAvailableResults": 1}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let query = QuerySpec::new().with_filter("value eq 'Prod'");
        let values = client
            .list_category_values(&fetcher(), "Env", &query)
            .await
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, "Prod");
    }

    #[tokio::test]
    async fn test_list_subnet_vms() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/nutanix/v3/vms/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [
                    {
                        "metadata": {"uuid": "vm-1"},
                        "spec": {"name": "web01", "resources": {"nic_list": [
                            {"subnet_reference": {"uuid": "s-1"}}
                        ]}}
                    },
                    {
                        "metadata": {"uuid": "vm-2"},
                        "spec": {"name": "db01", "resources": {"nic_list": [
                            {"subnet_reference": {"uuid": "s-2"}}
                        ]}}
                    }
                ],
                "metadata": {"total_matches": 2}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let vms = client.list_subnet_vms(&fetcher(), "s-1").await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].name, "web01");
    }

    #[tokio::test]
    async fn test_assign_category_merges_and_drops_status() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/nutanix/v3/vms/vm-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": {"uuid": "vm-1", "spec_version": 3, "categories": {"Owner": "ops"}},
                "spec": {"name": "web01"},
                "status": {"state": "COMPLETE"}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/nutanix/v3/vms/vm-1"))
            .and(body_json(json!({
                "metadata": {
                    "uuid": "vm-1",
                    "spec_version": 3,
                    "categories": {"Owner": "ops", "Env": "Prod"}
                },
                "spec": {"name": "web01"}
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let assignment = CategoryAssignment::parse("Env=Prod").unwrap();
        client.assign_category("vm-1", &assignment).await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_category_reports_rejection() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/nutanix/v3/vms/vm-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": {"uuid": "vm-1"}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/nutanix/v3/vms/vm-1"))
            .respond_with(ResponseTemplate::new(409).set_body_string("spec_version mismatch"))
            .mount(&mock_server)
            .await;

        let assignment = CategoryAssignment::parse("Env=Prod").unwrap();
        let err = client.assign_category("vm-1", &assignment).await.unwrap_err();
        match err {
            PrismError::Api { status, message } => {
                assert_eq!(status, 409);
                assert!(message.contains("spec_version mismatch"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}
