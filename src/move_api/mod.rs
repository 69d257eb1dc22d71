//! Nutanix Move client and migration workflow
//!
//! Move speaks its own v2 API with bearer-token auth. Workload inventory
//! is paged through the same [`Fetcher`](crate::prism::Fetcher) as Prism
//! Central listings.

mod api;
mod client;
mod commands;
mod credential_map;
mod models;
mod plan;

pub use api::PrepareOptions;
pub use client::{MoveClient, MoveListing};
pub use commands::run_move_command;
pub use credential_map::{CredentialMap, GuestLogin};
pub use models::{
    AosCluster, GuestScripts, MoveVm, NamedEntity, PlanSummary, PlanWorkload, Provider,
    ReadinessCheck, ReadinessReport, SourceNetwork, VmReference,
};
pub use plan::{default_plan_name, parse_network_map, NetworkMapping, Placement};
