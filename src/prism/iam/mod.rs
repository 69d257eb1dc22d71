//! IAM: roles, users, authorization policies and operations

mod api;
mod commands;
mod helpers;
mod models;

pub use commands::{
    run_operations_command, run_policies_command, run_role_action_command, run_role_command,
    run_roles_command, run_user_policies_command, run_users_command,
};
pub use helpers::{is_view_only, merge_operations, resolve_operations, UNKNOWN_OPERATION};
pub use models::{AuthorizationPolicy, Operation, ResolvedOperation, Role, User};
