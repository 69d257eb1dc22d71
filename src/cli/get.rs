//! Get command resource definitions and arguments

use clap::{Parser, Subcommand};

use super::common::{OutputFormat, QueryArgs};
use super::vms::PowerFilter;

/// Resource types for the 'get' command
#[derive(Subcommand, Debug)]
pub enum GetResource {
    /// List IAM roles
    Roles(ListArgs),

    /// Show one role with its operations
    Role(RoleArgs),

    /// List IAM users
    #[command(visible_alias = "user")]
    Users(UsersArgs),

    /// List the authorization policies that apply to a user
    #[command(visible_alias = "user-policy")]
    UserPolicies(UserPoliciesArgs),

    /// List authorization policies
    #[command(visible_alias = "policy", visible_alias = "authorization-policies")]
    Policies(ListArgs),

    /// List IAM operations (permissions)
    #[command(visible_alias = "ops", visible_alias = "permissions")]
    Operations(OperationsArgs),

    /// List VMs
    #[command(visible_alias = "vm")]
    Vms(VmsArgs),

    /// List subnets
    #[command(visible_alias = "subnet")]
    Subnets(ListArgs),

    /// List categories, or the values of one category key
    #[command(visible_alias = "category")]
    Categories(CategoriesArgs),

    /// List VMs with a NIC on a subnet
    SubnetVms(SubnetVmsArgs),
}

/// Arguments for plain list subcommands
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get vms' subcommand
#[derive(Parser, Debug)]
pub struct VmsArgs {
    /// Only VMs in this power state
    #[arg(long, value_enum)]
    pub power: Option<PowerFilter>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get role' subcommand
#[derive(Parser, Debug)]
pub struct RoleArgs {
    /// Role ExtId or display name
    pub role: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get users' subcommand
#[derive(Parser, Debug)]
pub struct UsersArgs {
    /// Match users whose username or display name contains TERM
    #[arg(short, long, value_name = "TERM", conflicts_with = "filter")]
    pub search: Option<String>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get user-policies' subcommand
#[derive(Parser, Debug)]
pub struct UserPoliciesArgs {
    /// Username or user ExtId
    pub user: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get operations' subcommand
#[derive(Parser, Debug)]
pub struct OperationsArgs {
    /// Only operations classified as view-only
    #[arg(long, default_value_t = false)]
    pub view_only: bool,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get categories' subcommand
#[derive(Parser, Debug)]
pub struct CategoriesArgs {
    /// Show the values of this category key only
    #[arg(long, conflicts_with = "filter")]
    pub key: Option<String>,

    /// Show unique category keys instead of key/value pairs
    #[arg(long, default_value_t = false, conflicts_with = "key")]
    pub keys_only: bool,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for 'get subnet-vms' subcommand
#[derive(Parser, Debug)]
pub struct SubnetVmsArgs {
    /// Subnet name or ExtId
    pub subnet: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}
