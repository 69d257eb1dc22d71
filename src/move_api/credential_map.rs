//! Guest credential mapping read from a CSV file

use log::{info, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::config::credentials::CSV_HEADER_NAMES;
use crate::error::{PrismError, Result};

/// Guest OS login for one VM
#[derive(Clone, PartialEq, Eq)]
pub struct GuestLogin {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for GuestLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestLogin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// VM name to guest login, from `servername,username,password` rows
#[derive(Debug, Clone, Default)]
pub struct CredentialMap {
    entries: HashMap<String, GuestLogin>,
}

impl CredentialMap {
    /// Read a mapping file; an optional header row is skipped
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PrismError::Credentials(format!(
                "Credential mapping file '{}' not found",
                path.display()
            )));
        }
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let map = Self::from_reader(reader)?;
        info!(
            "Loaded credentials for {} VMs from {}",
            map.len(),
            path.display()
        );
        Ok(map)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut entries = HashMap::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let row = index + 1;
            if row == 1 && is_header(record.get(0)) {
                continue;
            }
            if record.len() < 3 {
                warn!("Credential mapping row {}: expected 3 columns, skipping", row);
                continue;
            }
            let (server, username, password) = (&record[0], &record[1], &record[2]);
            if server.is_empty() || username.is_empty() || password.is_empty() {
                warn!("Credential mapping row {}: incomplete data, skipping", row);
                continue;
            }
            entries.insert(
                server.to_string(),
                GuestLogin {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn get(&self, vm_name: &str) -> Option<&GuestLogin> {
        self.entries.get(vm_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_header(first_cell: Option<&str>) -> bool {
    first_cell.is_some_and(|cell| {
        CSV_HEADER_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(cell))
    })
}
