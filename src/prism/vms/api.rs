//! VM API operations

use log::{debug, info, warn};
use serde_json::Value;

use super::models::{ProbeStatus, VersionProbe, Vm};
use crate::config::api;
use crate::error::{PrismError, Result};
use crate::prism::traits::decode_records;
use crate::prism::{EndpointCandidate, Fetcher, PageSource, PrismClient, QuerySpec, V3Listing};

pub(crate) const VMS: &str = "vmm.vms";
pub(crate) const V3_VMS: &str = "v3.vms";

pub(crate) fn vms_candidates() -> Vec<EndpointCandidate> {
    EndpointCandidate::from_template(api::VMM_VERSIONS, "vmm/{version}/ahv/config/vms")
}

pub(crate) fn v3_vms_candidates() -> Vec<EndpointCandidate> {
    vec![EndpointCandidate::new(
        api::V3_VERSION,
        format!("{}/list", api::V3_VMS_PATH),
    )]
}

/// OData clause matching VMs in a power state (`ON`, `OFF`)
pub fn power_state_filter(state: &str) -> String {
    format!("powerState eq '{}'", state)
}

/// Rewrite a v4 query for the v3 list call
///
/// The v3 API takes FIQL, so only a power-state filter carries over.
fn v3_query(query: &QuerySpec) -> Result<QuerySpec> {
    let mut v3 = QuerySpec::new().with_page_size(query.page_size);
    if !query.select.is_empty() || query.order_by.is_some() {
        debug!("--select and --order-by are not applied by the v3 VM list");
    }
    if let Some(ref filter) = query.filter {
        let state = ["ON", "OFF"]
            .into_iter()
            .find(|state| filter.trim() == power_state_filter(state))
            .ok_or_else(|| {
                PrismError::InvalidQuery(format!(
                    "Filter \"{}\" needs the VMM v4 API; the v3 VM list only supports --power",
                    filter
                ))
            })?;
        v3 = v3.with_filter(format!("power_state=={}", state.to_lowercase()));
    }
    Ok(v3)
}

impl PrismClient {
    /// Get all VMs matching the query
    ///
    /// Falls back to the v3 list when no VMM v4 version is available.
    pub async fn list_vms(&self, fetcher: &Fetcher, query: &QuerySpec) -> Result<Vec<Vm>> {
        match fetcher.fetch_all(self, VMS, &vms_candidates(), query).await {
            Ok(records) => decode_records(records, "VMs"),
            Err(PrismError::NoCompatibleEndpoint { tried, .. }) => {
                info!("No VMM v4 API answered (tried {}), using the v3 VM list", tried.join(", "));
                self.list_vms_v3(fetcher, query).await
            }
            Err(e) => Err(e),
        }
    }

    async fn list_vms_v3(&self, fetcher: &Fetcher, query: &QuerySpec) -> Result<Vec<Vm>> {
        let v3 = v3_query(query)?;
        let listing = V3Listing::new(self, "vm");
        let entities = fetcher
            .fetch_all(&listing, V3_VMS, &v3_vms_candidates(), &v3)
            .await?;
        Ok(entities.iter().map(Vm::from_v3_entity).collect())
    }

    /// Request one record from every VM endpoint version, v3 included
    ///
    /// Authentication failures abort the probe; any other failure is
    /// reported per version.
    pub async fn probe_vm_versions(&self) -> Result<Vec<VersionProbe>> {
        let query = QuerySpec::new().with_page_size(1);
        let mut probes = Vec::new();

        for endpoint in vms_candidates() {
            probes.push(probe_endpoint(self, &endpoint, &query).await?);
        }
        let listing = V3Listing::new(self, "vm");
        for endpoint in v3_vms_candidates() {
            probes.push(probe_endpoint(&listing, &endpoint, &query).await?);
        }
        Ok(probes)
    }

    /// Find a VM by ExtId or exact name
    ///
    /// Names go through a server-side filter; the first match wins.
    pub async fn find_vm(&self, fetcher: &Fetcher, input: &str) -> Result<Vm> {
        let by_name = QuerySpec::new().with_filter(format!("name eq '{}'", input.replace('\'', "''")));
        let mut matches = self.list_vms(fetcher, &by_name).await?;
        if matches.len() > 1 {
            warn!(
                "{} VMs are named '{}', using the first ({})",
                matches.len(),
                input,
                matches[0].ext_id
            );
        }
        if !matches.is_empty() {
            return Ok(matches.swap_remove(0));
        }

        let object = self
            .get_versioned(
                fetcher,
                VMS,
                &vms_candidates(),
                &urlencoding::encode(input),
                &format!("VM '{}'", input),
            )
            .await
            .map_err(|e| match e {
                PrismError::Api { status: 404, .. } => {
                    PrismError::Validation(format!("VM '{}' not found", input))
                }
                other => other,
            })?;
        let data = object.body.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data)
            .map_err(|e| PrismError::Json(format!("Failed to parse VM '{}': {}", input, e)))
    }
}

/// Request page 0 from one endpoint and classify the answer
async fn probe_endpoint<S: PageSource>(
    source: &S,
    endpoint: &EndpointCandidate,
    query: &QuerySpec,
) -> Result<VersionProbe> {
    debug!("Probing VM API {}", endpoint.version);
    let result = match source.request_page(endpoint, query, 0).await {
        Ok(reply) => match reply.status {
            200..=299 => VersionProbe {
                total_vms: source
                    .decode_page(&reply.body)
                    .ok()
                    .and_then(|page| page.total_available),
                ..probe(endpoint, ProbeStatus::Available, Some(reply.status))
            },
            401 | 403 => {
                return Err(PrismError::AuthenticationFailed {
                    status: reply.status,
                    message: format!(
                        "Prism Central rejected the credentials while probing {}",
                        endpoint.path
                    ),
                })
            }
            404 => probe(endpoint, ProbeStatus::NotFound, Some(404)),
            status => probe(endpoint, ProbeStatus::Error, Some(status)),
        },
        Err(e) => {
            warn!("Probe of {} failed: {}", endpoint.path, e);
            probe(endpoint, ProbeStatus::Error, None)
        }
    };
    Ok(result)
}

fn probe(endpoint: &EndpointCandidate, status: ProbeStatus, http_status: Option<u16>) -> VersionProbe {
    VersionProbe {
        version: endpoint.version.clone(),
        path: endpoint.path.clone(),
        status,
        http_status,
        total_vms: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prism::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(RetryPolicy::immediate())
    }

    #[tokio::test]
    async fn test_list_vms_single_page() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/vmm/v4.1/ahv/config/vms"))
            .and(query_param("$page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"extId": "vm-1", "name": "web01"},
                    {"extId": "vm-2", "name": "web02"}
                ],
                "metadata": {"totalAvailableResults": 2}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let vms = client.list_vms(&fetcher(), &QuerySpec::new()).await.unwrap();
        assert_eq!(vms.len(), 2);
        assert_eq!(vms[1].name, "web02");
    }

    #[tokio::test]
    async fn test_probe_reports_each_version() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/vmm/v4.1/ahv/config/vms"))
            .and(query_param("$limit", "1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vmm/v4.0/ahv/config/vms"))
            .and(query_param("$limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"extId": "vm-1"}],
                "metadata": {"totalAvailableResults": 42}
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/nutanix/v3/vms/list"))
            .and(body_partial_json(json!({"kind": "vm", "length": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [{"metadata": {"uuid": "vm-1"}}],
                "metadata": {"total_matches": 42}
            })))
            .mount(&mock_server)
            .await;

        let probes = client.probe_vm_versions().await.unwrap();
        assert_eq!(probes.len(), 3);
        assert_eq!(probes[0].version, "v4.1");
        assert_eq!(probes[0].status, ProbeStatus::NotFound);
        assert_eq!(probes[1].status, ProbeStatus::Available);
        assert_eq!(probes[1].total_vms, Some(42));
        assert_eq!(probes[2].version, "v3");
        assert_eq!(probes[2].status, ProbeStatus::Available);
        assert_eq!(probes[2].total_vms, Some(42));
    }

    #[tokio::test]
    async fn test_probe_stops_on_auth_failure() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/vmm/v4.1/ahv/config/vms"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let err = client.probe_vm_versions().await.unwrap_err();
        assert!(matches!(err, PrismError::AuthenticationFailed { status: 401, .. }));
    }

    async fn mount_v4_missing(mock_server: &MockServer) {
        for version in ["v4.1", "v4.0"] {
            Mock::given(method("GET"))
                .and(path(format!("/vmm/{}/ahv/config/vms", version)))
                .respond_with(ResponseTemplate::new(404))
                .expect(1)
                .mount(mock_server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_list_vms_falls_back_to_v3() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());
        mount_v4_missing(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/nutanix/v3/vms/list"))
            .and(body_partial_json(json!({
                "kind": "vm",
                "offset": 0,
                "filter": "power_state==on"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [{
                    "metadata": {"uuid": "vm-3"},
                    "spec": {
                        "name": "app03",
                        "cluster_reference": {"uuid": "c-1", "name": "cluster-a"},
                        "resources": {
                            "num_sockets": 2,
                            "num_vcpus_per_socket": 2,
                            "memory_size_mib": 4096
                        }
                    },
                    "status": {"resources": {"power_state": "ON"}}
                }],
                "metadata": {"total_matches": 1}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let query = QuerySpec::new().with_filter(power_state_filter("ON"));
        let vms = client.list_vms(&fetcher(), &query).await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].ext_id, "vm-3");
        assert_eq!(vms[0].name, "app03");
        assert_eq!(vms[0].power_state(), "ON");
        assert_eq!(vms[0].vcpus(), 4);
        assert_eq!(vms[0].memory_gib(), 4.0);
        assert_eq!(vms[0].cluster(), "cluster-a");
    }

    #[tokio::test]
    async fn test_v3_fallback_rejects_odata_filter() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());
        mount_v4_missing(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/nutanix/v3/vms/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entities": []})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let query = QuerySpec::new().with_filter("name eq 'web01'");
        let err = client.list_vms(&fetcher(), &query).await.unwrap_err();
        assert!(matches!(err, PrismError::InvalidQuery(ref m) if m.contains("name eq 'web01'")));
    }

    #[test]
    fn test_v3_query_translates_power_filter() {
        let query = QuerySpec::new()
            .with_page_size(50)
            .with_filter(power_state_filter("OFF"));
        let v3 = v3_query(&query).unwrap();
        assert_eq!(v3.filter.as_deref(), Some("power_state==off"));
        assert_eq!(v3.page_size, 50);

        assert!(v3_query(&QuerySpec::new()).unwrap().filter.is_none());
    }

    #[tokio::test]
    async fn test_find_vm_by_name_takes_first_match() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/vmm/v4.1/ahv/config/vms"))
            .and(query_param("$filter", "name eq 'web01'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"extId": "vm-1", "name": "web01"},
                    {"extId": "vm-9", "name": "web01"}
                ],
                "metadata": {"totalAvailableResults": 2}
            })))
            .mount(&mock_server)
            .await;

        let vm = client.find_vm(&fetcher(), "web01").await.unwrap();
        assert_eq!(vm.ext_id, "vm-1");
    }

    #[tokio::test]
    async fn test_find_vm_falls_back_to_ext_id() {
        let mock_server = MockServer::start().await;
        let client = PrismClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/vmm/v4.1/ahv/config/vms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "metadata": {"totalAvailableResults": 0}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vmm/v4.1/ahv/config/vms/vm-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"extId": "vm-7", "name": "db01"}
            })))
            .mount(&mock_server)
            .await;

        let vm = client.find_vm(&fetcher(), "vm-7").await.unwrap();
        assert_eq!(vm.name, "db01");
    }
}
