//! Move output formatters

use serde::Serialize;

use super::common::{render, table_string, Row};
use crate::cli::OutputFormat;
use crate::move_api::{MoveVm, PlanSummary, PlanWorkload, Provider, ReadinessReport};

#[derive(Serialize)]
struct ProviderRow {
    uuid: String,
    name: String,
    provider_type: String,
    state: String,
    address: String,
}

impl From<&Provider> for ProviderRow {
    fn from(provider: &Provider) -> Self {
        Self {
            uuid: provider.metadata.uuid.clone(),
            name: provider.spec.name.clone(),
            provider_type: provider.provider_type().to_string(),
            state: provider.state().to_string(),
            address: provider.address().to_string(),
        }
    }
}

impl Row for ProviderRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "TYPE", "STATE", "ADDRESS", "UUID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.provider_type.clone(),
            self.state.clone(),
            self.address.clone(),
            self.uuid.clone(),
        ]
    }
}

/// Output Move providers in the specified format
pub fn output_providers(providers: &[Provider], format: OutputFormat, no_header: bool) {
    let rows: Vec<ProviderRow> = providers.iter().map(ProviderRow::from).collect();
    render(&rows, format, no_header, "providers");
}

#[derive(Serialize)]
struct WorkloadRow {
    name: String,
    uuid: String,
    power_state: String,
    cpus: u64,
    memory_gib: f64,
    guest_os: String,
    networks: Vec<String>,
}

impl From<&MoveVm> for WorkloadRow {
    fn from(vm: &MoveVm) -> Self {
        Self {
            name: vm.name(),
            uuid: vm.uuid(),
            power_state: vm.power_state(),
            cpus: vm.cpus(),
            memory_gib: vm.memory_gib(),
            guest_os: vm.guest_os(),
            networks: vm.networks().into_iter().map(|n| n.name).collect(),
        }
    }
}

impl Row for WorkloadRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "POWER STATE", "CPU", "MEMORY (GiB)", "OS", "NETWORKS", "UUID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.power_state.clone(),
            self.cpus.to_string(),
            format!("{:.1}", self.memory_gib),
            self.guest_os.clone(),
            self.networks.join(", "),
            self.uuid.clone(),
        ]
    }
}

/// Output provider workloads in the specified format
pub fn output_move_workloads(vms: &[MoveVm], format: OutputFormat, no_header: bool) {
    let rows: Vec<WorkloadRow> = vms.iter().map(WorkloadRow::from).collect();
    render(&rows, format, no_header, "workloads");
}

#[derive(Serialize)]
struct PlanRow {
    uuid: String,
    name: String,
    state: String,
}

impl Row for PlanRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "STATE", "UUID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.state.clone(), self.uuid.clone()]
    }
}

/// Output migration plans in the specified format
pub fn output_plans(plans: &[PlanSummary], format: OutputFormat, no_header: bool) {
    let rows: Vec<PlanRow> = plans
        .iter()
        .map(|plan| PlanRow {
            uuid: plan.metadata.uuid.clone(),
            name: plan.metadata.name.clone(),
            state: plan.metadata.state().to_string(),
        })
        .collect();
    render(&rows, format, no_header, "plans");
}

#[derive(Serialize)]
struct PlanWorkloadRow {
    uuid: String,
    name: String,
    state: String,
    progress: f64,
}

impl Row for PlanWorkloadRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "STATE", "PROGRESS", "UUID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.state.clone(),
            format!("{}%", self.progress),
            self.uuid.clone(),
        ]
    }
}

/// Output the workloads of a plan in the specified format
pub fn output_plan_workloads(workloads: &[PlanWorkload], format: OutputFormat, no_header: bool) {
    let rows: Vec<PlanWorkloadRow> = workloads
        .iter()
        .map(|w| PlanWorkloadRow {
            uuid: w.metadata.uuid.clone(),
            name: w.metadata.name.clone(),
            state: w.metadata.state().to_string(),
            progress: w.progress(),
        })
        .collect();
    render(&rows, format, no_header, "workloads");
}

#[derive(Serialize)]
struct CheckRow {
    result: &'static str,
    check_type: String,
    message: String,
}

impl Row for CheckRow {
    fn headers() -> &'static [&'static str] {
        &["RESULT", "CHECK", "MESSAGE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.result.to_string(),
            self.check_type.clone(),
            self.message.clone(),
        ]
    }
}

fn check_rows(report: &ReadinessReport) -> Vec<CheckRow> {
    let failed = report.failed.iter().map(|c| ("FAILED", c));
    let passed = report.passed.iter().map(|c| ("PASSED", c));
    failed
        .chain(passed)
        .map(|(result, check)| CheckRow {
            result,
            check_type: check.check_type.clone(),
            message: check.message.clone(),
        })
        .collect()
}

/// Output readiness checks, failures first
pub fn output_readiness(report: &ReadinessReport, no_header: bool) {
    print!("{}", table_string(&check_rows(report), no_header, "checks"));
}
