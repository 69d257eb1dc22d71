//! VM command definitions and arguments

use clap::{Parser, Subcommand, ValueEnum};

use super::common::OutputFormat;

/// Actions for the 'vms' command
#[derive(Subcommand, Debug)]
pub enum VmsAction {
    /// Report which VM API versions this Prism Central answers
    Probe(VmsProbeArgs),
}

/// Arguments for 'vms probe'
#[derive(Parser, Debug)]
pub struct VmsProbeArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Power state accepted by 'get vms --power'
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerFilter {
    On,
    Off,
}

impl PowerFilter {
    /// Value of `powerState` in the VMM API
    pub fn as_api_str(&self) -> &'static str {
        match self {
            PowerFilter::On => "ON",
            PowerFilter::Off => "OFF",
        }
    }
}
