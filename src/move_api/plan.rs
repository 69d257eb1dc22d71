//! Migration plan assembly: placement, network mappings and the plan body

use chrono::{DateTime, TimeZone};
use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value};

use super::credential_map::CredentialMap;
use super::models::{AosCluster, MoveVm, NamedEntity, Provider, SourceNetwork};
use crate::error::{PrismError, Result};
use crate::prism::traits::find_resource;

/// Plan name used when none is given
pub fn default_plan_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("migration-{}", now.format("%Y%m%d-%H%M%S"))
}

/// Target cluster and container for an AOS target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub cluster_uuid: Option<String>,
    pub container_uuid: Option<String>,
}

/// Pick one entity by flag, or the only one when there is exactly one
fn pick<'a, T: crate::prism::PrismResource>(
    items: &'a [T],
    flag: Option<&str>,
    what: &str,
    flag_name: &str,
) -> Result<Option<&'a T>> {
    match (flag, items.len()) {
        (Some(input), _) => find_resource(items, input).map(Some).ok_or_else(|| {
            PrismError::Validation(format!("{} '{}' not found on the target provider", what, input))
        }),
        (None, 0) => Ok(None),
        (None, 1) => Ok(items.first()),
        (None, n) => {
            let names: Vec<&str> = items.iter().map(|i| i.name()).collect();
            Err(PrismError::Validation(format!(
                "Target provider has {} {}s ({}); choose one with {}",
                n,
                what.to_lowercase(),
                names.join(", "),
                flag_name
            )))
        }
    }
}

/// Resolve target cluster and container, auto-selecting single choices
///
/// Returns the selected cluster as well, for network lookups.
pub fn select_placement<'a>(
    target: &'a Provider,
    cluster_flag: Option<&str>,
    container_flag: Option<&str>,
) -> Result<(Placement, Option<&'a AosCluster>)> {
    if !target.is_aos() {
        return Ok((Placement::default(), None));
    }

    let clusters = target.clusters();
    if clusters.is_empty() {
        warn!("No clusters reported by target provider '{}'", target.spec.name);
        return Ok((
            Placement {
                cluster_uuid: cluster_flag.map(str::to_string),
                container_uuid: container_flag.map(str::to_string),
            },
            None,
        ));
    }

    let cluster = pick(clusters, cluster_flag, "Cluster", "--target-cluster")?;
    let containers = cluster.map(|c| c.containers.as_slice()).unwrap_or(&[]);
    let container = match pick(containers, container_flag, "Container", "--target-container")? {
        Some(container) => Some(container.uuid.clone()),
        None => {
            warn!("No storage containers found on the target cluster");
            None
        }
    };

    if let Some(c) = cluster {
        info!("Target cluster: {} ({})", c.name, c.uuid);
    }
    Ok((
        Placement {
            cluster_uuid: cluster.map(|c| c.uuid.clone()),
            container_uuid: container,
        },
        cluster,
    ))
}

/// `SourceInfo` block; AOS sources carry their first cluster
pub fn source_info(source: &Provider) -> Value {
    let mut info = json!({ "ProviderUUID": source.metadata.uuid });
    if source.is_aos() {
        match source.clusters().first() {
            Some(cluster) if !cluster.uuid.is_empty() => {
                info["AOSProviderAttrs"] = json!({ "ClusterUUID": cluster.uuid });
            }
            _ => warn!("No source cluster found on provider '{}'", source.spec.name),
        }
    }
    info
}

/// `TargetInfo` block
pub fn target_info(target: &Provider, placement: &Placement) -> Value {
    let mut info = json!({ "ProviderUUID": target.metadata.uuid });
    let mut attrs = serde_json::Map::new();
    if let Some(ref uuid) = placement.cluster_uuid {
        attrs.insert("ClusterUUID".to_string(), Value::String(uuid.clone()));
    }
    if let Some(ref uuid) = placement.container_uuid {
        attrs.insert("ContainerUUID".to_string(), Value::String(uuid.clone()));
    }
    if !attrs.is_empty() {
        info["AOSProviderAttrs"] = Value::Object(attrs);
    }
    info
}

/// One source to target network mapping
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NetworkMapping {
    #[serde(rename = "SourceNetworkID")]
    pub source_network_id: String,
    #[serde(rename = "TargetNetworkID")]
    pub target_network_id: String,
    #[serde(rename = "TestNetworkID", skip_serializing_if = "Option::is_none")]
    pub test_network_id: Option<String>,
}

/// Parse `SOURCE=TARGET[:TEST]`
pub fn parse_network_map(input: &str) -> Result<(String, String, Option<String>)> {
    let invalid = || {
        PrismError::Validation(format!(
            "Invalid network mapping '{}': expected SOURCE=TARGET[:TEST]",
            input
        ))
    };
    let (source, rest) = input.split_once('=').ok_or_else(invalid)?;
    let (target, test) = match rest.split_once(':') {
        Some((target, test)) => (target, Some(test.trim())),
        None => (rest, None),
    };
    let (source, target) = (source.trim(), target.trim());
    if source.is_empty() || target.is_empty() || test == Some("") {
        return Err(invalid());
    }
    Ok((
        source.to_string(),
        target.to_string(),
        test.map(str::to_string),
    ))
}

/// Build network mappings from explicit `--network-map` values and,
/// when `auto_map` is set, same-name matches for the remaining networks
pub fn resolve_network_mappings(
    explicit: &[String],
    auto_map: bool,
    source_networks: &[SourceNetwork],
    target_networks: &[NamedEntity],
) -> Result<Vec<NetworkMapping>> {
    let mut mappings: Vec<NetworkMapping> = Vec::new();

    for input in explicit {
        let (source, target, test) = parse_network_map(input)?;
        let source_id = source_networks
            .iter()
            .find(|n| n.id == source)
            .or_else(|| {
                source_networks
                    .iter()
                    .find(|n| n.name.eq_ignore_ascii_case(&source))
            })
            .map(|n| n.id.clone())
            .ok_or_else(|| {
                PrismError::Validation(format!(
                    "Source network '{}' is not used by the selected VMs",
                    source
                ))
            })?;
        let target_id = resolve_target_network(target_networks, &target)?;
        let test_id = match test {
            Some(test) => {
                let test_id = resolve_target_network(target_networks, &test)?;
                if test_id == target_id {
                    return Err(PrismError::Validation(format!(
                        "Test network for '{}' must differ from its target network",
                        source
                    )));
                }
                Some(test_id)
            }
            None => None,
        };
        mappings.retain(|m| m.source_network_id != source_id);
        mappings.push(NetworkMapping {
            source_network_id: source_id,
            target_network_id: target_id,
            test_network_id: test_id,
        });
    }

    for network in source_networks {
        if mappings.iter().any(|m| m.source_network_id == network.id) {
            continue;
        }
        let same_name = auto_map
            .then(|| target_networks.iter().find(|t| t.name == network.name))
            .flatten();
        match same_name {
            Some(target) => {
                info!("Auto-mapped network {} -> {}", network.name, target.name);
                mappings.push(NetworkMapping {
                    source_network_id: network.id.clone(),
                    target_network_id: target.uuid.clone(),
                    test_network_id: None,
                });
            }
            None => warn!(
                "Source network '{}' ({}) has no mapping; plan creation may fail",
                network.name, network.id
            ),
        }
    }
    Ok(mappings)
}

/// Target networks may be given by UUID or name; unknown inputs
/// containing '-' are taken as UUIDs
fn resolve_target_network(target_networks: &[NamedEntity], input: &str) -> Result<String> {
    match find_resource(target_networks, input) {
        Some(network) => Ok(network.uuid.clone()),
        None if input.contains('-') => Ok(input.to_string()),
        None => Err(PrismError::Validation(format!(
            "Target network '{}' not found",
            input
        ))),
    }
}

/// Unique networks used by the selected VMs, sorted by name
pub fn collect_source_networks(vms: &[MoveVm]) -> Vec<SourceNetwork> {
    let mut networks: Vec<SourceNetwork> = vms.iter().flat_map(MoveVm::networks).collect();
    networks.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    networks.dedup_by(|a, b| a.id == b.id);
    networks
}

/// Pick inventory records by VM name, in request order
///
/// Returns the matches and the names that were not found.
pub fn select_vms(inventory: &[MoveVm], names: &[String]) -> (Vec<MoveVm>, Vec<String>) {
    let mut selected = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        match inventory.iter().find(|vm| vm.name() == *name) {
            Some(vm) => selected.push(vm.clone()),
            None => missing.push(name.clone()),
        }
    }
    (selected, missing)
}

/// Plan creation body
///
/// Returns the body and how many VMs carry guest credentials.
pub fn plan_payload(
    name: &str,
    source_info: Value,
    target_info: Value,
    vms: &[MoveVm],
    credentials: &CredentialMap,
    network_mappings: &[NetworkMapping],
) -> (Value, usize) {
    let mut with_credentials = 0;
    let workloads: Vec<Value> = vms
        .iter()
        .map(|vm| {
            let (vm_name, uuid, vm_id) = (vm.name(), vm.uuid(), vm.vm_id());
            let mut workload = json!({
                "VMReference": { "UUID": uuid, "VMID": vm_id },
                "VMCustomizeType": "replicate",
                "GuestPrepMode": "auto"
            });
            match credentials.get(&vm_name) {
                Some(login) => {
                    workload["VMCustomizationConfig"] = json!({
                        "GuestCredentials": {
                            "UUID": uuid,
                            "VMId": vm_id,
                            "UserName": login.username,
                            "Password": login.password
                        }
                    });
                    with_credentials += 1;
                }
                None => warn!("No guest credentials mapped for VM '{}'", vm_name),
            }
            workload
        })
        .collect();

    let payload = json!({
        "Spec": {
            "Name": name,
            "SourceInfo": source_info,
            "TargetInfo": target_info,
            "Workload": { "Type": "VM", "VMs": workloads },
            "NetworkMappings": network_mappings
        }
    });
    (payload, with_credentials)
}
