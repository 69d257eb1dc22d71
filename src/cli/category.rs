//! Category command definitions and arguments

use clap::{ArgGroup, Parser, Subcommand};

use super::common::OutputFormat;

/// Actions for the 'category' command
#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// Assign a category value to VMs
    Assign(CategoryAssignArgs),
}

/// Arguments for 'category assign'
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("targets").required(true).args(["subnet", "vms"])))]
pub struct CategoryAssignArgs {
    /// Category as KEY=VALUE
    pub category: String,

    /// Assign to every VM with a NIC on this subnet (name or ExtId)
    #[arg(long)]
    pub subnet: Option<String>,

    /// Assign to this VM (name or UUID, repeatable)
    #[arg(long = "vm", value_name = "VM")]
    pub vms: Vec<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,

    /// Output format for the per-VM results
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}
