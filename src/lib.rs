//! prismctl - Operate Nutanix Prism Central and Move from the command line
//!
//! # Features
//!
//! - Paginated listings with automatic API version fallback and caching
//! - Retry with backoff for rate limits (429) and transient failures
//! - IAM roles, users, authorization policies and operations
//! - VM, subnet and category inventory, category assignment
//! - Nutanix Guest Tools status and installation
//! - Move migration plans: create, prepare, readiness, start, cutover
//! - Multiple output formats (table, CSV, JSON, YAML)
//!
//! # Example
//!
//! ```bash
//! # List roles
//! prismctl get roles -H pc.example.com -u admin
//!
//! # VMs whose name starts with "web", as JSON
//! prismctl get vms --filter "startswith(name,'web')" -o json
//!
//! # Which VM API versions does this Prism Central serve?
//! prismctl vms probe
//!
//! # Tag every VM on a subnet
//! prismctl category assign Environment=Production --subnet vlan10
//!
//! # Create a Move plan with a credential mapping file
//! prismctl move create-plan --source vcenter --target pc --vm web01 --credentials creds.csv
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod move_api;
pub mod output;
pub mod prism;
pub mod ui;

pub use cli::{Cli, Command, GetResource, MoveAction, OutputFormat};
pub use error::{PrismError, Result};
pub use move_api::{run_move_command, MoveClient};
pub use prism::{
    run_categories_command, run_category_assign_command, run_ngt_command, run_operations_command,
    run_policies_command, run_role_action_command, run_role_command, run_roles_command,
    run_subnet_vms_command, run_subnets_command, run_user_policies_command, run_users_command,
    run_vms_command, run_vms_probe_command, CliCredentials, ConnectionSettings,
    CredentialResolver, CredentialSource, Fetcher, PrismClient, QuerySpec, RetryPolicy,
};
