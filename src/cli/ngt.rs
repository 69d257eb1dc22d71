//! NGT command definitions and arguments

use clap::{Parser, Subcommand};

use super::common::OutputFormat;
use crate::config::defaults;

/// Actions for the 'ngt' command
#[derive(Subcommand, Debug)]
pub enum NgtAction {
    /// Show guest tools status of a VM
    Status(NgtStatusArgs),

    /// Mount the NGT ISO and install guest tools in a VM
    Install(NgtInstallArgs),
}

/// Arguments for 'ngt status'
#[derive(Parser, Debug)]
pub struct NgtStatusArgs {
    /// VM name or ExtId
    pub vm: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'ngt install'
#[derive(Parser, Debug)]
pub struct NgtInstallArgs {
    /// VM name or ExtId
    pub vm: String,

    /// Guest OS administrator username
    #[arg(long, env = "NGT_GUEST_USERNAME")]
    pub guest_username: Option<String>,

    /// Guest OS administrator password
    #[arg(long, env = "NGT_GUEST_PASSWORD", hide_env_values = true)]
    pub guest_password: Option<String>,

    /// Reboot the guest immediately after installation
    #[arg(long, default_value_t = false)]
    pub reboot: bool,

    /// Return after submitting instead of waiting for the task
    #[arg(long, default_value_t = false)]
    pub no_wait: bool,

    /// Seconds to wait for the installation task
    #[arg(long, default_value_t = defaults::TASK_TIMEOUT_SECS)]
    pub task_timeout: u64,

    /// Install even if guest tools are already installed
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
