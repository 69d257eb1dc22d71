//! Output formatting module
//!
//! Every listing renders as a table, CSV, JSON or YAML through the
//! [`Row`](common::Row) trait.

mod categories;
mod common;
mod iam;
mod move_api;
mod ngt;
mod vms;

pub use categories::{
    output_assign_outcomes, output_categories, output_category_keys, output_subnet_vms,
    output_subnets,
};
pub use common::{escape_csv, Row};
pub use iam::{output_operations, output_policies, output_role_details, output_roles, output_users};
pub use move_api::{
    output_move_workloads, output_plan_workloads, output_plans, output_providers,
    output_readiness,
};
pub use ngt::output_ngt_report;
pub use vms::{output_vm_probes, output_vms};
