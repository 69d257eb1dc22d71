//! Prism Central API client module
//!
//! This module provides the paginated fetcher and the resource APIs
//! (IAM, VMs, categories, NGT) built on it.

pub mod categories;
mod client;
mod credentials;
mod fetcher;
pub mod iam;
pub mod ngt;
mod retry;
pub mod traits;
pub mod vms;

pub use categories::{
    run_categories_command, run_category_assign_command, run_subnet_vms_command,
    run_subnets_command,
};
pub use client::{build_http_client, ConnectionSettings, PrismClient, V3Listing, VersionedObject};
pub use credentials::{
    normalize_host, CliCredentials, CredentialResolver, CredentialSource, Credentials,
};
pub use fetcher::{
    has_more_pages, EndpointCandidate, Fetcher, OrderBy, PageResult, PageSource, QuerySpec,
    RawReply, SortDirection,
};
pub use iam::{
    run_operations_command, run_policies_command, run_role_action_command, run_role_command,
    run_roles_command, run_user_policies_command, run_users_command,
};
pub use ngt::run_ngt_command;
pub use retry::RetryPolicy;
pub use traits::PrismResource;
pub use vms::{run_vms_command, run_vms_probe_command};

pub(crate) use client::{authority, check_response, parse_json, read_reply, send_for_json};
