//! Move API operations: inventory, plans and the migration workflow

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::client::{decode_move_page, expect_status, status_error, MoveClient, MoveListing};
use super::models::{
    GuestScripts, MoveVm, PlanSummary, PlanWorkload, Provider, ReadinessReport, VmReference,
};
use crate::cli::PrepMode;
use crate::error::{PrismError, Result};
use crate::prism::traits::{decode_records, find_resource};
use crate::prism::{EndpointCandidate, Fetcher, QuerySpec};

pub(crate) const WORKLOADS: &str = "move.workloads";

/// Guest changes requested from a prepare call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    pub install_ngt: bool,
    pub uninstall_guest_tools: bool,
    pub skip_ip_retention: bool,
}

impl Default for PrepareOptions {
    /// Install NGT, remove VMware tools, keep the guest IP configuration
    fn default() -> Self {
        Self {
            install_ngt: true,
            uninstall_guest_tools: true,
            skip_ip_retention: false,
        }
    }
}

impl PrepareOptions {
    fn query_string(&self) -> String {
        format!(
            "UninstallGuestTools={}&InstallNGT={}&SkipIPRetention={}",
            self.uninstall_guest_tools, self.install_ngt, self.skip_ip_retention
        )
    }
}

fn workloads_candidates(provider_uuid: &str) -> Vec<EndpointCandidate> {
    vec![EndpointCandidate::new(
        "v2",
        format!(
            "providers/{}/workloads/list",
            urlencoding::encode(provider_uuid)
        ),
    )]
}

impl MoveClient {
    /// POST an unpaged `.../list` call and decode its records
    async fn list_unpaged<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        what: &str,
    ) -> Result<Vec<T>> {
        let reply = self.post_json(path, body).await?;
        if reply.status != 200 {
            return Err(status_error(&reply, &format!("list {}", what)));
        }
        let page = decode_move_page(&reply.body)?;
        debug!("Listed {} {}", page.items.len(), what);
        decode_records(page.items, what)
    }

    /// List source and target providers
    pub async fn list_providers(&self) -> Result<Vec<Provider>> {
        let body = json!({ "RefreshInventory": false, "UpdateInventoryToPlans": true });
        self.list_unpaged("providers/list", &body, "providers").await
    }

    /// Get one provider with its clusters, containers and networks
    pub async fn get_provider(&self, uuid: &str) -> Result<Provider> {
        let url = self.url(&format!("providers/{}", urlencoding::encode(uuid)));
        debug!("GET {}", url);
        let reply = crate::prism::read_reply(self.get(&url).send().await?).await?;
        let value = expect_status(reply, &[200], &format!("get provider {}", uuid))?;
        serde_json::from_value(value)
            .map_err(|e| PrismError::Json(format!("Failed to parse provider {}: {}", uuid, e)))
    }

    /// Find a provider by UUID or name
    pub async fn find_provider(&self, input: &str) -> Result<Provider> {
        let providers = self.list_providers().await?;
        let found = find_resource(&providers, input)
            .ok_or_else(|| PrismError::Validation(format!("Provider '{}' not found", input)))?;
        self.get_provider(&found.metadata.uuid).await
    }

    /// List the workloads of a provider through the paginated fetcher
    pub async fn list_workloads(
        &self,
        fetcher: &Fetcher,
        provider_uuid: &str,
        refresh: bool,
        query: &QuerySpec,
    ) -> Result<Vec<MoveVm>> {
        let listing = MoveListing::new(
            self,
            json!({
                "RefreshInventory": refresh,
                "UpdateInventoryToPlans": true,
                "ShowVMS": "all",
                "SortBy": "VMName",
                "SortOrderDesc": false
            }),
        );
        let records = fetcher
            .fetch_all(&listing, WORKLOADS, &workloads_candidates(provider_uuid), query)
            .await?;
        Ok(records.into_iter().map(MoveVm).collect())
    }

    /// List migration plans
    pub async fn list_plans(&self) -> Result<Vec<PlanSummary>> {
        self.list_unpaged("plans/list", &json!({}), "plans").await
    }

    /// Find a plan by UUID or name
    pub async fn find_plan(&self, input: &str) -> Result<PlanSummary> {
        let plans = self.list_plans().await?;
        find_resource(&plans, input)
            .cloned()
            .ok_or_else(|| PrismError::Validation(format!("Plan '{}' not found", input)))
    }

    /// VM references stored in a plan
    pub async fn plan_vm_references(&self, plan_uuid: &str) -> Result<Vec<VmReference>> {
        let url = self.url(&format!("plans/{}", urlencoding::encode(plan_uuid)));
        debug!("GET {}", url);
        let reply = crate::prism::read_reply(self.get(&url).send().await?).await?;
        let plan = expect_status(reply, &[200], &format!("get plan {}", plan_uuid))?;
        let vms = plan
            .pointer("/Spec/Workload/VMs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        vms.into_iter()
            .filter_map(|vm| vm.get("VMReference").cloned())
            .map(|reference| {
                serde_json::from_value(reference)
                    .map_err(|e| PrismError::Json(format!("Failed to parse VM reference: {}", e)))
            })
            .collect()
    }

    /// Workloads of a plan with their state and progress
    pub async fn plan_workloads(&self, plan_uuid: &str) -> Result<Vec<PlanWorkload>> {
        let path = format!("plans/{}/workloads/list", urlencoding::encode(plan_uuid));
        self.list_unpaged(&path, &json!({}), "plan workloads").await
    }

    /// Create a plan and return its UUID
    pub async fn create_plan(&self, payload: &Value) -> Result<String> {
        let reply = self.post_json("plans", payload).await?;
        let created = expect_status(reply, &[200, 201], "create migration plan")?;
        let uuid = created
            .pointer("/MetaData/UUID")
            .and_then(Value::as_str)
            .filter(|uuid| !uuid.is_empty())
            .ok_or_else(|| {
                PrismError::Workflow("Plan creation response carried no plan UUID".to_string())
            })?;
        info!("Created migration plan {}", uuid);
        Ok(uuid.to_string())
    }

    /// Submit guest preparation for the VMs of a plan
    ///
    /// In manual mode the returned scripts must be run on the guests.
    pub async fn prepare_plan(
        &self,
        plan_uuid: &str,
        mode: PrepMode,
        options: PrepareOptions,
        vms: &[VmReference],
    ) -> Result<GuestScripts> {
        let path = format!(
            "plans/{}/prepare?{}",
            urlencoding::encode(plan_uuid),
            options.query_string()
        );
        debug!("Prepare options: {:?}", options);
        let vm_list: Vec<Value> = vms
            .iter()
            .map(|vm| json!({ "UUID": vm.uuid, "VMId": vm.vm_id }))
            .collect();
        let body = json!({ "GuestPrepMode": mode.as_api_str(), "VMs": vm_list });
        let reply = self.post_json(&path, &body).await?;
        let result = expect_status(reply, &[200, 202], "prepare plan")?;
        let scripts: GuestScripts = result
            .pointer("/Status/Result/GuestScript")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        Ok(scripts)
    }

    /// Run the readiness checks of a plan
    pub async fn check_readiness(&self, plan_uuid: &str) -> Result<ReadinessReport> {
        let path = format!("plans/{}/readiness", urlencoding::encode(plan_uuid));
        let reply = self.post_json(&path, &json!({})).await?;
        let result = expect_status(reply, &[200], "check readiness")?;
        let status = result.get("Status").cloned().unwrap_or(Value::Null);
        if status.is_null() {
            return Ok(ReadinessReport::default());
        }
        Ok(serde_json::from_value(status)?)
    }

    /// Start (seed) a plan, optionally with a snapshot frequency in minutes
    pub async fn start_plan(&self, plan_uuid: &str, frequency: Option<u32>) -> Result<()> {
        let path = format!("plans/{}/start", urlencoding::encode(plan_uuid));
        let body = match frequency {
            Some(minutes) => json!({ "Spec": { "Frequency": minutes } }),
            None => json!({}),
        };
        let reply = self.post_json(&path, &body).await?;
        expect_status(reply, &[200, 202], "start migration")?;
        info!("Started plan {}", plan_uuid);
        Ok(())
    }

    /// Run an action (test, undotest, cutover, ...) on one plan workload
    pub async fn workload_action(
        &self,
        plan_uuid: &str,
        workload_uuid: &str,
        action: &str,
    ) -> Result<()> {
        let path = format!(
            "plans/{}/workloads/{}/action",
            urlencoding::encode(plan_uuid),
            urlencoding::encode(workload_uuid)
        );
        let reply = self
            .post_json(&path, &json!({ "Spec": { "Action": action } }))
            .await?;
        expect_status(reply, &[200, 202], &format!("run {} action", action))?;
        info!("Submitted {} for workload {}", action, workload_uuid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prism::RetryPolicy;
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, MoveClient) {
        let mock_server = MockServer::start().await;
        let client = MoveClient::test_client(&mock_server.uri());
        (mock_server, client)
    }

    #[tokio::test]
    async fn test_find_provider_fetches_details() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/providers/list"))
            .and(body_json(json!({"RefreshInventory": false, "UpdateInventoryToPlans": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Entities": [
                    {"MetaData": {"UUID": "p-1"}, "Spec": {"Name": "vcenter", "Type": "VMWARE_ESXI_VCENTER"}},
                    {"MetaData": {"UUID": "p-2"}, "Spec": {"Name": "pc", "Type": "AOS_PC"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/providers/p-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MetaData": {"UUID": "p-2"},
                "Spec": {"Name": "pc", "Type": "AOS_PC", "AOSProperties": {"Clusters": [{"UUID": "c-1", "Name": "east"}]}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = client.find_provider("PC").await.unwrap();
        assert_eq!(provider.clusters()[0].uuid, "c-1");

        let err = client.find_provider("hyperv").await.unwrap_err();
        assert!(err.to_string().contains("hyperv"));
    }

    #[tokio::test]
    async fn test_list_workloads_sends_inventory_body() {
        let (mock_server, client) = setup().await;
        let fetcher = Fetcher::new(RetryPolicy::immediate());

        Mock::given(method("POST"))
            .and(path("/providers/p-1/workloads/list"))
            .and(body_partial_json(json!({
                "RefreshInventory": true,
                "ShowVMS": "all",
                "SortBy": "VMName",
                "Limit": 100,
                "Offset": 0,
                "Query": "web"
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "Entities": [{"VMName": "web01"}, {"VMName": "web02"}],
                "MetaData": {"Count": 2}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let query = QuerySpec::new().with_filter("web");
        let vms = client
            .list_workloads(&fetcher, "p-1", true, &query)
            .await
            .unwrap();
        assert_eq!(vms.len(), 2);
        assert_eq!(vms[1].name(), "web02");
        assert_eq!(fetcher.resolved_version(WORKLOADS).as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_create_plan_returns_uuid() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans"))
            .and(body_partial_json(json!({"Spec": {"Name": "wave1"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "MetaData": {"UUID": "pl-1"}
            })))
            .mount(&mock_server)
            .await;

        let uuid = client
            .create_plan(&json!({"Spec": {"Name": "wave1"}}))
            .await
            .unwrap();
        assert_eq!(uuid, "pl-1");
    }

    #[tokio::test]
    async fn test_create_plan_rejected() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans"))
            .respond_with(ResponseTemplate::new(400).set_body_string("NetworkMappings required"))
            .mount(&mock_server)
            .await;

        let err = client.create_plan(&json!({})).await.unwrap_err();
        assert!(matches!(err, PrismError::Api { status: 400, .. }));
        assert!(err.to_string().contains("NetworkMappings required"));
    }

    #[tokio::test]
    async fn test_prepare_plan_manual_returns_scripts() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/pl-1/prepare"))
            .and(query_param("InstallNGT", "true"))
            .and(query_param("UninstallGuestTools", "true"))
            .and(query_param("SkipIPRetention", "false"))
            .and(body_json(json!({
                "GuestPrepMode": "manual",
                "VMs": [{"UUID": "u-1", "VMId": "vm-1"}]
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "Status": {"Result": {"GuestScript": {"LinuxGuestScript": "curl ... | sh"}}}
            })))
            .mount(&mock_server)
            .await;

        let vms = vec![VmReference {
            uuid: "u-1".to_string(),
            vm_id: "vm-1".to_string(),
        }];
        let scripts = client
            .prepare_plan("pl-1", PrepMode::Manual, PrepareOptions::default(), &vms)
            .await
            .unwrap();
        assert_eq!(scripts.linux.as_deref(), Some("curl ... | sh"));
        assert!(scripts.windows.is_none());
    }

    #[tokio::test]
    async fn test_prepare_plan_sends_operator_options() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/pl-1/prepare"))
            .and(query_param("InstallNGT", "false"))
            .and(query_param("UninstallGuestTools", "false"))
            .and(query_param("SkipIPRetention", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = PrepareOptions {
            install_ngt: false,
            uninstall_guest_tools: false,
            skip_ip_retention: true,
        };
        let vms = vec![VmReference {
            uuid: "u-1".to_string(),
            vm_id: "vm-1".to_string(),
        }];
        let scripts = client
            .prepare_plan("pl-1", PrepMode::Auto, options, &vms)
            .await
            .unwrap();
        assert!(scripts.is_empty());
    }

    #[test]
    fn test_prepare_options_default_keeps_ip() {
        let query = PrepareOptions::default().query_string();
        assert!(query.contains("SkipIPRetention=false"));
        assert!(query.contains("InstallNGT=true"));
        assert!(query.contains("UninstallGuestTools=true"));
    }

    #[tokio::test]
    async fn test_plan_vm_references() {
        let (mock_server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/plans/pl-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Spec": {"Workload": {"VMs": [
                    {"VMReference": {"UUID": "u-1", "VMID": "vm-1"}},
                    {"VMReference": {"UUID": "u-2", "VMID": "vm-2"}}
                ]}}
            })))
            .mount(&mock_server)
            .await;

        let refs = client.plan_vm_references("pl-1").await.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].vm_id, "vm-2");
    }

    #[tokio::test]
    async fn test_readiness_report() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/pl-1/readiness"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Status": {
                    "Passed": [{"CheckType": "Connectivity", "Message": "ok"}],
                    "Failed": [{"CheckType": "DiskSpace", "Message": "not enough space"}]
                }
            })))
            .mount(&mock_server)
            .await;

        let report = client.check_readiness("pl-1").await.unwrap();
        assert_eq!(report.passed.len(), 1);
        assert!(!report.is_ready());
        assert_eq!(report.failed[0].check_type, "DiskSpace");
    }

    #[tokio::test]
    async fn test_start_plan_with_frequency() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/pl-1/start"))
            .and(body_json(json!({"Spec": {"Frequency": 60}})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock_server)
            .await;

        client.start_plan("pl-1", Some(60)).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_plan_without_frequency_sends_empty_body() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/pl-1/start"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        client.start_plan("pl-1", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_workload_action() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/pl-1/workloads/w-1/action"))
            .and(body_json(json!({"Spec": {"Action": "test"}})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/plans/pl-1/workloads/w-2/action"))
            .respond_with(ResponseTemplate::new(409).set_body_string("not cutover ready"))
            .mount(&mock_server)
            .await;

        client.workload_action("pl-1", "w-1", "test").await.unwrap();
        let err = client
            .workload_action("pl-1", "w-2", "cutover")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not cutover ready"));
    }

    #[tokio::test]
    async fn test_plan_workloads_and_find_plan() {
        let (mock_server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/plans/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Entities": [{"MetaData": {"UUID": "pl-1", "Name": "wave1", "StateString": "Ready"}}]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/plans/pl-1/workloads/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Entities": [{
                    "MetaData": {"UUID": "w-1", "Name": "web01", "StateString": "CutoverReady"},
                    "Status": {"PercentageComplete": 100}
                }]
            })))
            .mount(&mock_server)
            .await;

        let plan = client.find_plan("wave1").await.unwrap();
        assert_eq!(plan.metadata.state(), "Ready");
        let workloads = client.plan_workloads(&plan.metadata.uuid).await.unwrap();
        assert_eq!(workloads[0].progress(), 100.0);
        assert!(client.find_plan("wave2").await.is_err());
    }
}
