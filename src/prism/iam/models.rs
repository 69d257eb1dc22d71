//! IAM data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prism::traits::PrismResource;

/// Role from the IAM authz API
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub is_system_defined: Option<bool>,
    #[serde(default)]
    pub assigned_users_count: Option<u64>,
    #[serde(default)]
    pub assigned_user_groups_count: Option<u64>,
}

impl Role {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn is_system_defined(&self) -> bool {
        self.is_system_defined.unwrap_or(false)
    }

    /// "System" or "Custom"
    pub fn kind(&self) -> &'static str {
        if self.is_system_defined() {
            "System"
        } else {
            "Custom"
        }
    }
}

impl PrismResource for Role {
    fn ext_id(&self) -> &str {
        &self.ext_id
    }

    fn name(&self) -> &str {
        &self.display_name
    }
}

/// User from the IAM authn API
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email_id: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("")
    }

    pub fn user_type(&self) -> &str {
        self.user_type.as_deref().unwrap_or("")
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

impl PrismResource for User {
    fn ext_id(&self) -> &str {
        &self.ext_id
    }

    fn name(&self) -> &str {
        &self.username
    }
}

/// Authorization policy binding a role to identities and entities
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationPolicy {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authorization_policy_type: Option<String>,
    /// ExtId of the bound role
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub identities: Vec<Value>,
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub is_system_defined: Option<bool>,
}

impl AuthorizationPolicy {
    pub fn policy_type(&self) -> &str {
        self.authorization_policy_type.as_deref().unwrap_or("")
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or("")
    }

    /// Whether any identity filter mentions one of `needles`
    ///
    /// Filters are nested JSON of arbitrary shape, so the comparison runs on
    /// their lowercase serialized form.
    pub fn mentions_identity(&self, needles: &[&str]) -> bool {
        let needles: Vec<String> = needles
            .iter()
            .filter(|n| !n.is_empty())
            .map(|n| n.to_lowercase())
            .collect();
        if needles.is_empty() {
            return false;
        }
        self.identities.iter().any(|identity| {
            let filter = identity.get("identityFilter").unwrap_or(identity);
            let haystack = filter.to_string().to_lowercase();
            needles.iter().any(|n| haystack.contains(n.as_str()))
        })
    }
}

impl PrismResource for AuthorizationPolicy {
    fn ext_id(&self) -> &str {
        &self.ext_id
    }

    fn name(&self) -> &str {
        &self.display_name
    }
}

/// Permission (operation) from the IAM operations catalogue
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub ext_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
}

impl Operation {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn entity_type(&self) -> &str {
        self.entity_type.as_deref().unwrap_or("")
    }
}

impl PrismResource for Operation {
    fn ext_id(&self) -> &str {
        &self.ext_id
    }

    fn name(&self) -> &str {
        &self.display_name
    }
}

/// An operation of a role, resolved against the catalogue
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    pub ext_id: String,
    pub display_name: String,
    pub entity_type: String,
}
