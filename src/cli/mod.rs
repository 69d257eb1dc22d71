//! CLI argument parsing

mod category;
mod common;
mod get;
mod migrate;
mod ngt;
mod role;
mod vms;

use clap::{Parser, Subcommand};

use crate::config::defaults;

pub use category::{CategoryAction, CategoryAssignArgs};
pub use common::{OutputFormat, QueryArgs};
pub use get::{
    CategoriesArgs, GetResource, ListArgs, OperationsArgs, RoleArgs, SubnetVmsArgs,
    UserPoliciesArgs, UsersArgs, VmsArgs,
};
pub use migrate::{
    CreatePlanArgs, MoveAction, MoveConnectionArgs, MoveListArgs, MovePlanListArgs,
    MoveWorkloadsArgs, PlanArgs, PrepMode, PrepareArgs, StartArgs, WorkloadActionArgs,
};
pub use ngt::{NgtAction, NgtInstallArgs, NgtStatusArgs};
pub use role::{RoleAction, RoleAddViewOnlyArgs, RoleCreateArgs};
pub use vms::{PowerFilter, VmsAction, VmsProbeArgs};

/// Nutanix Prism Central and Move operator CLI
#[derive(Parser, Debug)]
#[command(name = "prismctl")]
#[command(version)]
#[command(
    about = "Explore Prism Central IAM and inventory, install NGT and drive Move migrations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Prism Central host (falls back to PRISM_HOST)
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Prism Central username (falls back to PRISM_USERNAME)
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Prism Central password (falls back to PRISM_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long, global = true, default_value_t = false)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = defaults::TIMEOUT_SECS)]
    pub timeout: u64,

    /// Batch mode: no prompts, no spinners
    #[arg(short, long, global = true, default_value_t = false)]
    pub batch: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// Omit table/CSV headers and totals
    #[arg(long, global = true, default_value_t = false)]
    pub no_header: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List or show resources
    Get {
        #[command(subcommand)]
        resource: GetResource,
    },

    /// Create or extend IAM roles
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// VM API diagnostics
    Vms {
        #[command(subcommand)]
        action: VmsAction,
    },

    /// Assign categories to VMs
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Nutanix Guest Tools status and installation
    Ngt {
        #[command(subcommand)]
        action: NgtAction,
    },

    /// Move migration workflow
    #[command(name = "move")]
    Move {
        #[command(flatten)]
        connection: MoveConnectionArgs,

        #[command(subcommand)]
        action: MoveAction,
    },
}
