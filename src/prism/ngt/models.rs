//! Guest tools and task models

use serde::{Deserialize, Serialize};

/// Guest tools (NGT) state of a VM
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GuestTools {
    #[serde(default)]
    pub is_installed: Option<bool>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub is_reachable: Option<bool>,
    #[serde(default)]
    pub is_iso_inserted: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub available_version: Option<String>,
    #[serde(default)]
    pub guest_os_version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl GuestTools {
    pub fn is_installed(&self) -> bool {
        self.is_installed.unwrap_or(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled.unwrap_or(false)
    }

    pub fn is_reachable(&self) -> bool {
        self.is_reachable.unwrap_or(false)
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

/// Coarse NGT state used to decide whether to install
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NgtStatus {
    InstalledEnabled,
    InstalledDisabled,
    NotInstalled,
    Unknown,
}

impl NgtStatus {
    /// Classify guest tools info; `None` when it could not be read
    pub fn classify(tools: Option<&GuestTools>) -> Self {
        match tools {
            None => NgtStatus::Unknown,
            Some(t) if t.is_installed() && t.is_enabled() => NgtStatus::InstalledEnabled,
            Some(t) if t.is_installed() => NgtStatus::InstalledDisabled,
            Some(t) if t.is_installed.is_some() => NgtStatus::NotInstalled,
            Some(_) => NgtStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NgtStatus::InstalledEnabled => "installed_enabled",
            NgtStatus::InstalledDisabled => "installed_disabled",
            NgtStatus::NotInstalled => "not_installed",
            NgtStatus::Unknown => "unknown",
        }
    }
}

/// Guest tools state of one VM, as reported by `ngt status`
#[derive(Serialize, Debug, Clone)]
pub struct NgtReport {
    pub vm: String,
    pub ext_id: String,
    pub status: NgtStatus,
    pub installed: bool,
    pub enabled: bool,
    pub reachable: bool,
    pub version: String,
}

impl NgtReport {
    pub fn new(vm: &str, ext_id: &str, tools: &GuestTools) -> Self {
        Self {
            vm: vm.to_string(),
            ext_id: ext_id.to_string(),
            status: NgtStatus::classify(Some(tools)),
            installed: tools.is_installed(),
            enabled: tools.is_enabled(),
            reachable: tools.is_reachable(),
            version: tools.version().to_string(),
        }
    }
}

/// Error message attached to a failed task
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskMessage {
    #[serde(default)]
    pub message: String,
}

/// Asynchronous task from the prism v4 tasks API
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress_percentage: Option<u32>,
    #[serde(default)]
    pub error_messages: Vec<TaskMessage>,
}

/// Where a task is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Succeeded,
    Failed,
    Running,
    Other,
}

impl Task {
    pub fn state(&self) -> TaskState {
        match self.status.as_deref() {
            Some("SUCCEEDED") => TaskState::Succeeded,
            Some("FAILED") | Some("CANCELED") => TaskState::Failed,
            Some("PENDING") | Some("RUNNING") | Some("QUEUED") => TaskState::Running,
            _ => TaskState::Other,
        }
    }

    /// Joined error messages, or a placeholder when there are none
    pub fn error_summary(&self) -> String {
        let messages: Vec<&str> = self
            .error_messages
            .iter()
            .map(|m| m.message.as_str())
            .filter(|m| !m.is_empty())
            .collect();
        if messages.is_empty() {
            "no error details available".to_string()
        } else {
            messages.join("; ")
        }
    }
}
