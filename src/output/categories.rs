//! Subnet, category and category assignment output formatters

use serde::Serialize;

use super::common::{render, Row};
use crate::cli::OutputFormat;
use crate::prism::categories::{AssignOutcome, Category, Subnet, V3Vm};

#[derive(Serialize)]
struct SubnetRow {
    ext_id: String,
    name: String,
    subnet_type: String,
    vlan: Option<u32>,
    cluster: String,
}

impl From<&Subnet> for SubnetRow {
    fn from(subnet: &Subnet) -> Self {
        Self {
            ext_id: subnet.ext_id.clone(),
            name: subnet.name.clone(),
            subnet_type: subnet.subnet_type().to_string(),
            vlan: subnet.network_id,
            cluster: subnet.cluster_reference.clone().unwrap_or_default(),
        }
    }
}

impl Row for SubnetRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "TYPE", "VLAN", "EXT ID", "CLUSTER"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.subnet_type.clone(),
            self.vlan.map(|v| v.to_string()).unwrap_or_default(),
            self.ext_id.clone(),
            self.cluster.clone(),
        ]
    }
}

/// Output subnets in the specified format
pub fn output_subnets(subnets: &[Subnet], format: OutputFormat, no_header: bool) {
    let rows: Vec<SubnetRow> = subnets.iter().map(SubnetRow::from).collect();
    render(&rows, format, no_header, "subnets");
}

impl Row for Category {
    fn headers() -> &'static [&'static str] {
        &["KEY", "VALUE", "TYPE", "EXT ID", "DESCRIPTION"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.value.clone(),
            self.category_type().to_string(),
            self.ext_id.clone(),
            self.description().to_string(),
        ]
    }
}

/// Output category key/value pairs
pub fn output_categories(categories: &[Category], format: OutputFormat, no_header: bool) {
    render(categories, format, no_header, "categories");
}

#[derive(Serialize)]
struct KeyRow {
    key: String,
}

impl Row for KeyRow {
    fn headers() -> &'static [&'static str] {
        &["KEY"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.key.clone()]
    }
}

/// Output unique category keys
pub fn output_category_keys(keys: &[String], format: OutputFormat, no_header: bool) {
    let rows: Vec<KeyRow> = keys.iter().map(|key| KeyRow { key: key.clone() }).collect();
    render(&rows, format, no_header, "category keys");
}

impl Row for V3Vm {
    fn headers() -> &'static [&'static str] {
        &["NAME", "UUID", "POWER"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.uuid.clone(), self.power_state.clone()]
    }
}

/// Output VMs attached to a subnet
pub fn output_subnet_vms(vms: &[V3Vm], format: OutputFormat, no_header: bool) {
    render(vms, format, no_header, "VMs");
}

impl Row for AssignOutcome {
    fn headers() -> &'static [&'static str] {
        &["VM", "UUID", "RESULT", "MESSAGE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.vm.clone(),
            self.uuid.clone(),
            if self.success { "✓ assigned" } else { "✗ failed" }.to_string(),
            self.message.clone(),
        ]
    }
}

/// Output per-VM category assignment results
pub fn output_assign_outcomes(outcomes: &[AssignOutcome], format: OutputFormat, no_header: bool) {
    render(outcomes, format, no_header, "VMs");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::common::csv_string;

    #[test]
    fn test_subnet_row() {
        let subnet = Subnet {
            ext_id: "s-1".to_string(),
            name: "vlan10".to_string(),
            subnet_type: Some("VLAN".to_string()),
            network_id: Some(10),
            ..Subnet::default()
        };
        assert_eq!(
            SubnetRow::from(&subnet).cells(),
            vec!["vlan10", "VLAN", "10", "s-1", ""]
        );
    }

    #[test]
    fn test_keys_csv() {
        let rows = vec![
            KeyRow { key: "AppType".to_string() },
            KeyRow { key: "Env".to_string() },
        ];
        assert_eq!(csv_string(&rows, false), "KEY\nAppType\nEnv\n");
    }

    #[test]
    fn test_assign_outcome_cells() {
        let outcome = AssignOutcome {
            vm: "web01".to_string(),
            uuid: "vm-1".to_string(),
            success: false,
            message: "HTTP 409".to_string(),
        };
        assert_eq!(outcome.cells()[2], "✗ failed");
    }
}
