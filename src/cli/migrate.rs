//! Move migration command definitions and arguments

use clap::{Args, Parser, Subcommand, ValueEnum};

use super::common::OutputFormat;
use crate::config::move_api;

/// Move appliance connection options
#[derive(Args, Debug, Clone, Default)]
pub struct MoveConnectionArgs {
    /// Move appliance host (falls back to MOVE_HOST)
    #[arg(long, global = true)]
    pub move_host: Option<String>,

    /// Move username (falls back to MOVE_USERNAME)
    #[arg(long, global = true)]
    pub move_username: Option<String>,

    /// Move password (falls back to MOVE_PASSWORD)
    #[arg(long, global = true)]
    pub move_password: Option<String>,
}

/// Actions for the 'move' command
#[derive(Subcommand, Debug)]
pub enum MoveAction {
    /// List source and target providers
    Providers(MoveListArgs),

    /// List the workloads (VMs) of a source provider
    Workloads(MoveWorkloadsArgs),

    /// List migration plans
    Plans(MoveListArgs),

    /// Show migration status of the workloads in a plan
    PlanWorkloads(MovePlanListArgs),

    /// Create a migration plan
    CreatePlan(CreatePlanArgs),

    /// Prepare the source VMs of a plan
    Prepare(PrepareArgs),

    /// Run readiness checks for a plan
    Readiness(PlanArgs),

    /// Start (seed) a migration plan
    Start(StartArgs),

    /// Run an action on a plan workload (test, undotest, cutover, ...)
    Action(WorkloadActionArgs),
}

/// Arguments for Move list subcommands
#[derive(Parser, Debug)]
pub struct MoveListArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'move workloads'
#[derive(Parser, Debug)]
pub struct MoveWorkloadsArgs {
    /// Source provider name or UUID
    pub provider: String,

    /// Server-side search string
    #[arg(short, long)]
    pub query: Option<String>,

    /// Refresh the provider inventory first
    #[arg(long, default_value_t = false)]
    pub refresh: bool,

    /// Records per request (1-100)
    #[arg(long, default_value_t = move_api::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments naming a plan
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Plan name or UUID
    pub plan: String,
}

/// Arguments for 'move plan-workloads'
#[derive(Parser, Debug)]
pub struct MovePlanListArgs {
    /// Plan name or UUID
    pub plan: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'move create-plan'
#[derive(Parser, Debug)]
pub struct CreatePlanArgs {
    /// Plan name (default: migration-<timestamp>)
    #[arg(long)]
    pub name: Option<String>,

    /// Source provider name or UUID
    #[arg(long)]
    pub source: String,

    /// Target provider name or UUID
    #[arg(long)]
    pub target: String,

    /// Target cluster name or UUID (required when the target has several)
    #[arg(long)]
    pub target_cluster: Option<String>,

    /// Target storage container name or UUID (required when there are several)
    #[arg(long)]
    pub target_container: Option<String>,

    /// VM to migrate, by name (repeatable)
    #[arg(long = "vm", value_name = "VM", required = true)]
    pub vms: Vec<String>,

    /// CSV file with servername,username,password rows
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<std::path::PathBuf>,

    /// Network mapping SOURCE=TARGET[:TEST] by name or ID (repeatable)
    #[arg(long = "network-map", value_name = "MAPPING")]
    pub network_maps: Vec<String>,

    /// Map every source network to the target network of the same name
    #[arg(long, default_value_t = false)]
    pub auto_map_networks: bool,
}

/// Guest preparation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrepMode {
    /// Move prepares the guests using the mapped credentials
    Auto,
    /// Print the preparation scripts to run by hand
    Manual,
}

impl PrepMode {
    /// Value of `GuestPrepMode` in the API
    pub fn as_api_str(&self) -> &'static str {
        match self {
            PrepMode::Auto => "auto",
            PrepMode::Manual => "manual",
        }
    }
}

/// Arguments for 'move prepare'
#[derive(Parser, Debug)]
pub struct PrepareArgs {
    /// Plan name or UUID
    pub plan: String,

    /// Guest preparation mode
    #[arg(long, value_enum, default_value_t = PrepMode::Auto)]
    pub mode: PrepMode,

    /// Do not install Nutanix Guest Tools on the guests
    #[arg(long, default_value_t = false)]
    pub no_install_ngt: bool,

    /// Leave VMware guest tools installed
    #[arg(long, default_value_t = false)]
    pub keep_guest_tools: bool,

    /// Drop the guest IP configuration instead of retaining it
    #[arg(long, default_value_t = false)]
    pub skip_ip_retention: bool,
}

/// Arguments for 'move start'
#[derive(Parser, Debug)]
pub struct StartArgs {
    /// Plan name or UUID
    pub plan: String,

    /// Snapshot frequency in minutes
    #[arg(long)]
    pub frequency: Option<u32>,
}

/// Arguments for 'move action'
#[derive(Parser, Debug)]
pub struct WorkloadActionArgs {
    /// Plan name or UUID
    pub plan: String,

    /// Workload (VM) name or UUID
    pub workload: String,

    /// Action to run: test, retest, undotest, cutover, ...
    pub action: String,

    /// Skip the cutover confirmation prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,
}
