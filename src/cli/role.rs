//! Role command definitions and arguments

use clap::{Parser, Subcommand};

/// Actions for the 'role' command
#[derive(Subcommand, Debug)]
pub enum RoleAction {
    /// Create a custom role
    Create(RoleCreateArgs),

    /// Add every view-only operation to an existing role
    AddViewOnly(RoleAddViewOnlyArgs),
}

/// Arguments for 'role create'
#[derive(Parser, Debug)]
pub struct RoleCreateArgs {
    /// Role display name
    pub name: String,

    /// Role description (max 1000 characters)
    #[arg(short, long)]
    pub description: Option<String>,

    /// Operation ExtId or name to include (repeatable)
    #[arg(long = "operation", value_name = "OPERATION")]
    pub operations: Vec<String>,

    /// Include every view-only operation
    #[arg(long, default_value_t = false)]
    pub view_only: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,
}

/// Arguments for 'role add-view-only'
#[derive(Parser, Debug)]
pub struct RoleAddViewOnlyArgs {
    /// Role ExtId or display name
    pub role: String,

    /// Skip confirmation prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,
}
