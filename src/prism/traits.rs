//! Common traits for Prism Central resources

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PrismError, Result};

/// Common trait for Prism resources (roles, users, VMs, subnets, ...)
///
/// Provides a unified interface for identification and lookup by
/// user input.
pub trait PrismResource {
    /// Get the resource ExtId
    fn ext_id(&self) -> &str;

    /// Get the human-readable name
    fn name(&self) -> &str;

    /// Check if the resource matches by ExtId or name
    ///
    /// ExtIds match exactly, names case-insensitively.
    fn matches(&self, input: &str) -> bool {
        self.ext_id() == input || self.name().eq_ignore_ascii_case(input)
    }
}

/// Deserialize raw fetcher records into typed models
pub fn decode_records<T>(records: Vec<Value>, what: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    records
        .into_iter()
        .map(|record| {
            serde_json::from_value(record)
                .map_err(|e| PrismError::Json(format!("Failed to parse {}: {}", what, e)))
        })
        .collect()
}

/// Find a resource by ExtId or name
pub fn find_resource<'a, T: PrismResource>(items: &'a [T], input: &str) -> Option<&'a T> {
    items
        .iter()
        .find(|item| item.ext_id() == input)
        .or_else(|| items.iter().find(|item| item.matches(input)))
}
