//! Guest tools API operations and task monitoring

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::header::IF_MATCH;
use serde_json::{json, Value};
use tokio::time::Instant;

use super::models::{GuestTools, Task, TaskState};
use crate::config::api;
use crate::error::{PrismError, Result};
use crate::prism::client::read_reply;
use crate::prism::vms::{vms_candidates, VMS};
use crate::prism::{EndpointCandidate, Fetcher, PrismClient};

const CAPABILITIES: [&str; 2] = ["SELF_SERVICE_RESTORE", "VSS_SNAPSHOT"];

/// Guest OS account used by the installer
#[derive(Clone)]
pub struct GuestCredential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for GuestCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Guest tools info with the ETag guarding the next action
#[derive(Debug, Clone)]
pub struct GuestToolsSnapshot {
    pub tools: GuestTools,
    pub etag: Option<String>,
    pub endpoint: EndpointCandidate,
}

/// Guest tools action under `$actions/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestToolsAction {
    InsertIso,
    Install,
}

impl GuestToolsAction {
    fn path_segment(&self) -> &'static str {
        match self {
            GuestToolsAction::InsertIso => "insert-iso",
            GuestToolsAction::Install => "install",
        }
    }
}

impl fmt::Display for GuestToolsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuestToolsAction::InsertIso => write!(f, "NGT ISO insertion"),
            GuestToolsAction::Install => write!(f, "NGT installation"),
        }
    }
}

pub fn insert_iso_payload() -> Value {
    json!({
        "capabilities": CAPABILITIES,
        "isConfigOnly": false,
        "$objectType": "vmm.v4.ahv.config.GuestToolsInsertConfig",
    })
}

pub fn install_payload(credential: &GuestCredential, reboot: bool) -> Value {
    json!({
        "capabilities": CAPABILITIES,
        "credential": {
            "username": credential.username,
            "password": credential.password,
            "$objectType": "vmm.v4.ahv.config.Credential",
        },
        "rebootPreference": {
            "scheduleType": if reboot { "IMMEDIATE" } else { "SKIP" },
            "$objectType": "vmm.v4.ahv.config.RebootPreference",
        },
        "$objectType": "vmm.v4.ahv.config.GuestToolsInstallConfig",
    })
}

/// Task ExtId from an action response (`data.extId`)
fn task_id(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/data/extId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl PrismClient {
    /// Read a VM's guest tools info and ETag
    pub async fn get_guest_tools(
        &self,
        fetcher: &Fetcher,
        vm_ext_id: &str,
    ) -> Result<GuestToolsSnapshot> {
        let object = self
            .get_versioned(
                fetcher,
                VMS,
                &vms_candidates(),
                &format!("{}/guest-tools", urlencoding::encode(vm_ext_id)),
                &format!("guest tools of VM {}", vm_ext_id),
            )
            .await?;
        let data = match object.body.get("data") {
            Some(data) => data.clone(),
            None => object.body.clone(),
        };
        let tools: GuestTools = serde_json::from_value(data).map_err(|e| {
            PrismError::Json(format!("Failed to parse guest tools of VM {}: {}", vm_ext_id, e))
        })?;
        debug!("Guest tools of {}: {:?} (ETag {:?})", vm_ext_id, tools, object.etag);
        Ok(GuestToolsSnapshot {
            tools,
            etag: object.etag,
            endpoint: object.endpoint,
        })
    }

    /// Submit a guest tools action guarded by the current ETag
    ///
    /// A 412 means the ETag went stale; it is refreshed and the action
    /// retried once. Returns the task ExtId when the server reports one.
    pub async fn guest_tools_action(
        &self,
        fetcher: &Fetcher,
        vm_ext_id: &str,
        action: GuestToolsAction,
        body: &Value,
    ) -> Result<Option<String>> {
        let mut retried = false;
        loop {
            let snapshot = self.get_guest_tools(fetcher, vm_ext_id).await?;
            let etag = snapshot.etag.ok_or_else(|| {
                PrismError::Workflow(format!(
                    "No ETag returned for guest tools of VM {}; cannot submit {}",
                    vm_ext_id, action
                ))
            })?;
            let url = self.url(&format!(
                "{}/{}/guest-tools/$actions/{}",
                snapshot.endpoint.path,
                urlencoding::encode(vm_ext_id),
                action.path_segment()
            ));
            debug!("Submitting {} at {}", action, url);

            let response = self
                .post(&url)
                .header(IF_MATCH, etag)
                .json(body)
                .send()
                .await?;
            let reply = read_reply(response).await?;
            match reply.status {
                200..=299 => {
                    let task = task_id(&reply.body);
                    info!("{} submitted for VM {} (task {:?})", action, vm_ext_id, task);
                    return Ok(task);
                }
                412 if !retried => {
                    info!("ETag for VM {} is stale, retrying {} with a fresh one", vm_ext_id, action);
                    retried = true;
                }
                401 | 403 => {
                    return Err(PrismError::AuthenticationFailed {
                        status: reply.status,
                        message: format!("Not allowed to submit {} for VM {}", action, vm_ext_id),
                    })
                }
                status => {
                    return Err(PrismError::Api {
                        status,
                        message: format!("Failed to submit {}: {}", action, reply.body.trim()),
                    })
                }
            }
        }
    }

    /// Read one task
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        let body: Value = self
            .get_json(&format!("{}/{}", api::TASKS_PATH, task_id), &format!("task {}", task_id))
            .await?;
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data)
            .map_err(|e| PrismError::Json(format!("Failed to parse task {}: {}", task_id, e)))
    }

    /// Poll a task until it succeeds, fails or `timeout` elapses
    ///
    /// Transient read errors are logged and polling continues.
    pub async fn wait_for_task(
        &self,
        task_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Task> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.get_task(task_id).await {
                Ok(task) => match task.state() {
                    TaskState::Succeeded => return Ok(task),
                    TaskState::Failed => {
                        return Err(PrismError::Workflow(format!(
                            "Task {} failed: {}",
                            task_id,
                            task.error_summary()
                        )))
                    }
                    TaskState::Running => debug!(
                        "Task {} is {} ({}%)",
                        task_id,
                        task.status.as_deref().unwrap_or(""),
                        task.progress_percentage.unwrap_or(0)
                    ),
                    TaskState::Other => warn!(
                        "Task {} has unexpected status {:?}",
                        task_id, task.status
                    ),
                },
                Err(e @ PrismError::AuthenticationFailed { .. }) => return Err(e),
                Err(e) => warn!("Could not read task {} (will keep polling): {}", task_id, e),
            }

            if Instant::now() >= deadline {
                return Err(PrismError::Workflow(format!(
                    "Task {} did not finish within {} seconds",
                    task_id,
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(interval).await;
        }
    }
}
