//! Move API data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prism::traits::PrismResource;

/// Provider types backed by Nutanix AOS
pub const AOS_PROVIDER_TYPES: &[&str] = &["AOS_PC", "AOS_AHV_PE"];

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ProviderMetadata {
    #[serde(rename = "UUID", default)]
    pub uuid: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AccessInfo {
    #[serde(rename = "IPorFQDN", default)]
    pub ip_or_fqdn: Option<String>,
    #[serde(rename = "Region", default)]
    pub region: Option<String>,
    #[serde(rename = "ResourceGroupName", default)]
    pub resource_group_name: Option<String>,
}

/// UUID and name pair, used for containers and networks
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct NamedEntity {
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

impl PrismResource for NamedEntity {
    fn ext_id(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cluster known to an AOS provider
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AosCluster {
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Containers", default)]
    pub containers: Vec<NamedEntity>,
    #[serde(rename = "Networks", default)]
    pub networks: Vec<NamedEntity>,
}

impl PrismResource for AosCluster {
    fn ext_id(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AosProperties {
    #[serde(rename = "Clusters", default)]
    pub clusters: Vec<AosCluster>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ProviderSpec {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub provider_type: Option<String>,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "AOSAccessInfo", default)]
    pub aos_access_info: Option<AccessInfo>,
    #[serde(rename = "VCenterAccessInfo", default)]
    pub vcenter_access_info: Option<AccessInfo>,
    #[serde(rename = "AWSAccessInfo", default)]
    pub aws_access_info: Option<AccessInfo>,
    #[serde(rename = "AzureAccessInfo", default)]
    pub azure_access_info: Option<AccessInfo>,
    #[serde(rename = "AOSProperties", default)]
    pub aos_properties: Option<AosProperties>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ProviderStatus {
    #[serde(rename = "State", default)]
    pub state: Option<String>,
}

/// Move source or target environment
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Provider {
    #[serde(rename = "MetaData", default)]
    pub metadata: ProviderMetadata,
    #[serde(rename = "Spec", default)]
    pub spec: ProviderSpec,
    #[serde(rename = "Status", default)]
    pub status: Option<ProviderStatus>,
}

impl Provider {
    pub fn provider_type(&self) -> &str {
        self.spec.provider_type.as_deref().unwrap_or("Unknown")
    }

    /// Status state, falling back to the spec state
    pub fn state(&self) -> &str {
        self.status
            .as_ref()
            .and_then(|s| s.state.as_deref())
            .or(self.spec.state.as_deref())
            .unwrap_or("Unknown")
    }

    /// IP or FQDN for on-prem providers, region or resource group for clouds
    pub fn address(&self) -> &str {
        let spec = &self.spec;
        if let Some(ref info) = spec.aos_access_info {
            return info.ip_or_fqdn.as_deref().unwrap_or("");
        }
        if let Some(ref info) = spec.vcenter_access_info {
            return info.ip_or_fqdn.as_deref().unwrap_or("");
        }
        if let Some(ref info) = spec.aws_access_info {
            return info.region.as_deref().unwrap_or("");
        }
        if let Some(ref info) = spec.azure_access_info {
            return info.resource_group_name.as_deref().unwrap_or("");
        }
        ""
    }

    pub fn is_aos(&self) -> bool {
        AOS_PROVIDER_TYPES.contains(&self.provider_type())
    }

    pub fn clusters(&self) -> &[AosCluster] {
        self.spec
            .aos_properties
            .as_ref()
            .map(|p| p.clusters.as_slice())
            .unwrap_or(&[])
    }
}

impl PrismResource for Provider {
    fn ext_id(&self) -> &str {
        &self.metadata.uuid
    }

    fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Source network attached to a workload
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceNetwork {
    pub id: String,
    pub name: String,
}

/// Workload record as returned by a provider inventory
///
/// The record layout varies by provider type, so fields are looked up in
/// the record itself, then `Spec`, `Resources` and `Spec.Resources`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct MoveVm(pub Value);

impl MoveVm {
    fn sections(&self) -> [Option<&Value>; 4] {
        let record = &self.0;
        [
            Some(record),
            record.get("Spec"),
            record.get("Resources"),
            record.get("Spec").and_then(|s| s.get("Resources")),
        ]
    }

    /// First non-null value among `fields`, searching every section in order
    pub fn property(&self, fields: &[&str]) -> Option<&Value> {
        self.sections().into_iter().flatten().find_map(|section| {
            fields
                .iter()
                .filter_map(|field| section.get(*field))
                .find(|value| !value.is_null())
        })
    }

    /// String form of a property; numbers are formatted
    pub fn property_string(&self, fields: &[&str]) -> Option<String> {
        match self.property(fields)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        self.property_string(&["VMName", "Name", "name", "DisplayName", "display_name"])
            .unwrap_or_default()
    }

    pub fn uuid(&self) -> String {
        self.property_string(&["VMUuid", "UUID", "VmID"])
            .unwrap_or_default()
    }

    /// Source-side VM identifier, falling back to the UUID
    pub fn vm_id(&self) -> String {
        self.property_string(&["VmID", "VMUuid", "RecID"])
            .unwrap_or_else(|| self.uuid())
    }

    pub fn power_state(&self) -> String {
        self.property_string(&["PowerState", "power_state", "State"])
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn cpus(&self) -> u64 {
        self.property(&["NumCPU", "NumCpus", "cpu_cores"])
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Memory in GiB; the raw value may be bytes, MiB or GiB
    pub fn memory_gib(&self) -> f64 {
        let raw = self
            .property(&["MemoryMB", "memory_mb", "MemoryBytes"])
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let gib = if raw > 1024.0 * 1024.0 {
            raw / (1024.0 * 1024.0 * 1024.0)
        } else if raw > 1024.0 {
            raw / 1024.0
        } else {
            raw
        };
        (gib * 10.0).round() / 10.0
    }

    pub fn guest_os(&self) -> String {
        self.property_string(&["GuestOS", "os", "OperatingSystem", "OSType"])
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Networks from the top-level `Networks` list
    pub fn networks(&self) -> Vec<SourceNetwork> {
        self.0
            .get("Networks")
            .and_then(Value::as_array)
            .map(|networks| {
                networks
                    .iter()
                    .filter_map(|n| {
                        let id = n.get("ID").and_then(Value::as_str)?;
                        if id.is_empty() {
                            return None;
                        }
                        Some(SourceNetwork {
                            id: id.to_string(),
                            name: n
                                .get("Name")
                                .and_then(Value::as_str)
                                .unwrap_or("")
                                .to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PlanMetadata {
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "StateString", default)]
    pub state_string: Option<String>,
    #[serde(rename = "StatusString", default)]
    pub status_string: Option<String>,
}

impl PlanMetadata {
    pub fn state(&self) -> &str {
        self.state_string
            .as_deref()
            .or(self.status_string.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Migration plan entry from `plans/list`
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PlanSummary {
    #[serde(rename = "MetaData", default)]
    pub metadata: PlanMetadata,
}

impl PrismResource for PlanSummary {
    fn ext_id(&self) -> &str {
        &self.metadata.uuid
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct WorkloadStatus {
    #[serde(rename = "PercentageComplete", default)]
    pub percentage_complete: Option<f64>,
}

/// Workload (VM) inside a migration plan
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PlanWorkload {
    #[serde(rename = "MetaData", default)]
    pub metadata: PlanMetadata,
    #[serde(rename = "Status", default)]
    pub status: Option<WorkloadStatus>,
}

impl PlanWorkload {
    pub fn progress(&self) -> f64 {
        self.status
            .as_ref()
            .and_then(|s| s.percentage_complete)
            .unwrap_or(0.0)
    }
}

impl PrismResource for PlanWorkload {
    fn ext_id(&self) -> &str {
        &self.metadata.uuid
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// VM reference stored in a plan's workload spec
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct VmReference {
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    #[serde(rename = "VMID", default)]
    pub vm_id: String,
}

/// One readiness check result
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ReadinessCheck {
    #[serde(rename = "CheckType", default)]
    pub check_type: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Passed and failed readiness checks of a plan
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ReadinessReport {
    #[serde(rename = "Passed", default, deserialize_with = "null_as_empty")]
    pub passed: Vec<ReadinessCheck>,
    #[serde(rename = "Failed", default, deserialize_with = "null_as_empty")]
    pub failed: Vec<ReadinessCheck>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.failed.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<ReadinessCheck>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ReadinessCheck>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Guest preparation scripts returned by a manual prepare
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GuestScripts {
    #[serde(rename = "LinuxGuestScript", default)]
    pub linux: Option<String>,
    #[serde(rename = "WindowsGuestScript", default)]
    pub windows: Option<String>,
}

impl GuestScripts {
    pub fn is_empty(&self) -> bool {
        self.linux.as_deref().unwrap_or("").is_empty()
            && self.windows.as_deref().unwrap_or("").is_empty()
    }
}
