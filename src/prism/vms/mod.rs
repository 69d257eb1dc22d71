//! VMs: listing, lookup and API version probing

mod api;
mod commands;
mod models;

pub use api::power_state_filter;
pub(crate) use api::{v3_vms_candidates, vms_candidates, V3_VMS, VMS};
pub use commands::{run_vms_command, run_vms_probe_command};
pub use models::{EntityReference, ProbeStatus, VersionProbe, Vm};
