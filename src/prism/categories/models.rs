//! Subnet, category and v3 VM models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PrismError, Result};
use crate::prism::traits::PrismResource;

/// Subnet from the networking v4 API
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subnet_type: Option<String>,
    #[serde(default)]
    pub network_id: Option<u32>,
    #[serde(default)]
    pub cluster_reference: Option<String>,
}

impl Subnet {
    pub fn subnet_type(&self) -> &str {
        self.subnet_type.as_deref().unwrap_or("")
    }
}

impl PrismResource for Subnet {
    fn ext_id(&self) -> &str {
        &self.ext_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Category key/value pair from the prism v4 API
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub category_type: Option<String>,
}

impl Category {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn category_type(&self) -> &str {
        self.category_type.as_deref().unwrap_or("")
    }
}

/// Category assignment parsed from `KEY=VALUE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAssignment {
    pub key: String,
    pub value: String,
}

impl CategoryAssignment {
    pub fn parse(input: &str) -> Result<Self> {
        match input.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => Ok(Self {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(PrismError::Validation(format!(
                "Invalid category '{}'. Expected KEY=VALUE",
                input
            ))),
        }
    }
}

impl std::fmt::Display for CategoryAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// The fields of a v3 VM entity the category workflow needs
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct V3Vm {
    pub uuid: String,
    pub name: String,
    pub power_state: String,
}

impl V3Vm {
    pub fn from_entity(entity: &Value) -> Self {
        let text = |ptr: &str| {
            entity
                .pointer(ptr)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            uuid: text("/metadata/uuid"),
            name: text("/spec/name"),
            power_state: text("/spec/resources/power_state"),
        }
    }
}

/// Whether a v3 VM entity has a NIC on the subnet
pub fn attached_to_subnet(entity: &Value, subnet_uuid: &str) -> bool {
    entity
        .pointer("/spec/resources/nic_list")
        .and_then(Value::as_array)
        .map(|nics| {
            nics.iter().any(|nic| {
                nic.pointer("/subnet_reference/uuid").and_then(Value::as_str) == Some(subnet_uuid)
            })
        })
        .unwrap_or(false)
}

/// Result of assigning a category to one VM
#[derive(Serialize, Debug, Clone)]
pub struct AssignOutcome {
    pub vm: String,
    pub uuid: String,
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignment() {
        let a = CategoryAssignment::parse(" Env = Prod ").unwrap();
        assert_eq!(a.key, "Env");
        assert_eq!(a.value, "Prod");
        assert_eq!(a.to_string(), "Env=Prod");
    }

    #[test]
    fn test_parse_assignment_keeps_equals_in_value() {
        let a = CategoryAssignment::parse("Owner=team=a").unwrap();
        assert_eq!(a.value, "team=a");
    }

    #[test]
    fn test_parse_assignment_invalid() {
        assert!(CategoryAssignment::parse("Env").is_err());
        assert!(CategoryAssignment::parse("=Prod").is_err());
        assert!(CategoryAssignment::parse("Env=").is_err());
    }

    #[test]
    fn test_deserialize_category() {
        let c: Category = serde_json::from_value(json!({
            "extId": "c-1", "key": "Env", "value": "Prod", "type": "USER"
        }))
        .unwrap();
        assert_eq!(c.category_type(), "USER");
        assert_eq!(c.description(), "");
    }

    #[test]
    fn test_v3_vm_and_subnet_attachment() {
        let entity = json!({
            "metadata": {"uuid": "vm-1"},
            "spec": {
                "name": "web01",
                "resources": {
                    "power_state": "ON",
                    "nic_list": [
                        {"subnet_reference": {"uuid": "s-1"}},
                        {"subnet_reference": {"uuid": "s-2"}}
                    ]
                }
            }
        });
        let vm = V3Vm::from_entity(&entity);
        assert_eq!(vm.uuid, "vm-1");
        assert_eq!(vm.name, "web01");
        assert!(attached_to_subnet(&entity, "s-2"));
        assert!(!attached_to_subnet(&entity, "s-3"));
        assert!(!attached_to_subnet(&json!({"spec": {}}), "s-1"));
    }
}
