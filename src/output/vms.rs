//! VM output formatters

use serde::Serialize;

use super::common::{render, Row};
use crate::cli::OutputFormat;
use crate::prism::vms::{VersionProbe, Vm};

#[derive(Serialize)]
struct VmRow {
    ext_id: String,
    name: String,
    power_state: String,
    vcpus: u32,
    memory_gib: f64,
    cluster: String,
    host: String,
}

impl From<&Vm> for VmRow {
    fn from(vm: &Vm) -> Self {
        Self {
            ext_id: vm.ext_id.clone(),
            name: vm.name.clone(),
            power_state: vm.power_state().to_string(),
            vcpus: vm.vcpus(),
            memory_gib: vm.memory_gib(),
            cluster: vm.cluster().to_string(),
            host: vm.host().to_string(),
        }
    }
}

impl Row for VmRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "EXT ID", "POWER", "VCPUS", "MEMORY GIB", "CLUSTER", "HOST"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.ext_id.clone(),
            self.power_state.clone(),
            self.vcpus.to_string(),
            format!("{:.2}", self.memory_gib),
            self.cluster.clone(),
            self.host.clone(),
        ]
    }
}

/// Output VMs in the specified format
pub fn output_vms(vms: &[Vm], format: OutputFormat, no_header: bool) {
    let rows: Vec<VmRow> = vms.iter().map(VmRow::from).collect();
    render(&rows, format, no_header, "VMs");
}

impl Row for VersionProbe {
    fn headers() -> &'static [&'static str] {
        &["VERSION", "STATUS", "HTTP", "VMS", "PATH"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.version.clone(),
            self.status.as_str().to_string(),
            self.http_status.map(|s| s.to_string()).unwrap_or_default(),
            self.total_vms.map(|t| t.to_string()).unwrap_or_default(),
            self.path.clone(),
        ]
    }
}

/// Output VM API probe results
pub fn output_vm_probes(probes: &[VersionProbe], format: OutputFormat, no_header: bool) {
    render(probes, format, no_header, "API versions");
}
