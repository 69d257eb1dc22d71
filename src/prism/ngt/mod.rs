//! Nutanix Guest Tools: status, ISO insertion, installation and task monitoring

mod api;
mod commands;
mod models;

pub use api::{
    install_payload, insert_iso_payload, GuestCredential, GuestToolsAction, GuestToolsSnapshot,
};
pub use commands::run_ngt_command;
pub use models::{GuestTools, NgtReport, NgtStatus, Task, TaskState};
