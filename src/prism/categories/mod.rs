//! Subnets, categories and category assignment

mod api;
mod commands;
mod models;

pub use api::category_keys;
pub use commands::{
    run_categories_command, run_category_assign_command, run_subnet_vms_command,
    run_subnets_command,
};
pub use models::{attached_to_subnet, AssignOutcome, Category, CategoryAssignment, Subnet, V3Vm};
