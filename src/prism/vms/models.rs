//! VM data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prism::traits::PrismResource;

/// Reference to another entity, as embedded in a v4 VM
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    #[serde(default)]
    pub ext_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// VM from the VMM v4 API
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub power_state: Option<String>,
    #[serde(default)]
    pub num_sockets: Option<u32>,
    #[serde(default)]
    pub num_cores_per_socket: Option<u32>,
    #[serde(default)]
    pub memory_size_bytes: Option<u64>,
    #[serde(default)]
    pub cluster: Option<EntityReference>,
    #[serde(default)]
    pub host: Option<EntityReference>,
}

impl Vm {
    /// Map a v3 `vms/list` entity onto the v4 shape
    pub fn from_v3_entity(entity: &Value) -> Self {
        let text = |ptr: &str| entity.pointer(ptr).and_then(Value::as_str).map(str::to_string);
        let number = |ptr: &str| entity.pointer(ptr).and_then(Value::as_u64);
        let reference = |key: &str| {
            entity
                .pointer(&format!("/spec/{}", key))
                .or_else(|| entity.pointer(&format!("/status/resources/{}", key)))
                .map(|r| EntityReference {
                    ext_id: r.get("uuid").and_then(Value::as_str).map(str::to_string),
                    name: r.get("name").and_then(Value::as_str).map(str::to_string),
                })
        };

        Self {
            ext_id: text("/metadata/uuid").unwrap_or_default(),
            name: text("/spec/name")
                .or_else(|| text("/status/name"))
                .unwrap_or_default(),
            power_state: text("/status/resources/power_state")
                .or_else(|| text("/spec/resources/power_state"))
                .map(|state| state.to_uppercase()),
            num_sockets: number("/spec/resources/num_sockets").map(|n| n as u32),
            num_cores_per_socket: number("/spec/resources/num_vcpus_per_socket").map(|n| n as u32),
            memory_size_bytes: number("/spec/resources/memory_size_mib").map(|mib| mib * 1024 * 1024),
            cluster: reference("cluster_reference"),
            host: reference("host_reference"),
        }
    }

    pub fn power_state(&self) -> &str {
        self.power_state.as_deref().unwrap_or("")
    }

    /// Sockets times cores per socket; missing values count as one
    pub fn vcpus(&self) -> u32 {
        self.num_sockets.unwrap_or(1) * self.num_cores_per_socket.unwrap_or(1)
    }

    pub fn memory_gib(&self) -> f64 {
        let bytes = self.memory_size_bytes.unwrap_or(0) as f64;
        (bytes / (1024.0 * 1024.0 * 1024.0) * 100.0).round() / 100.0
    }

    /// Cluster name, or its ExtId when the name is not expanded
    pub fn cluster(&self) -> &str {
        reference_label(self.cluster.as_ref())
    }

    pub fn host(&self) -> &str {
        reference_label(self.host.as_ref())
    }
}

fn reference_label(reference: Option<&EntityReference>) -> &str {
    reference
        .and_then(|r| r.name.as_deref().or(r.ext_id.as_deref()))
        .unwrap_or("")
}

impl PrismResource for Vm {
    fn ext_id(&self) -> &str {
        &self.ext_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Availability of one VM API version
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Available,
    NotFound,
    Error,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Available => "available",
            ProbeStatus::NotFound => "not found",
            ProbeStatus::Error => "error",
        }
    }
}

/// Outcome of probing one endpoint candidate
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    pub version: String,
    pub path: String,
    pub status: ProbeStatus,
    pub http_status: Option<u16>,
    /// `totalAvailableResults` reported by an available endpoint
    pub total_vms: Option<u64>,
}
