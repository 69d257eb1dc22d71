//! IAM output formatters

use serde::Serialize;

use super::common::{render, table_string, yes_no, Row};
use crate::cli::OutputFormat;
use crate::prism::iam::{AuthorizationPolicy, Operation, ResolvedOperation, Role, User};

/// Serializable role for structured output
#[derive(Serialize)]
struct RoleRow {
    ext_id: String,
    name: String,
    kind: String,
    operations: usize,
    description: String,
}

impl From<&Role> for RoleRow {
    fn from(role: &Role) -> Self {
        Self {
            ext_id: role.ext_id.clone(),
            name: role.display_name.clone(),
            kind: role.kind().to_string(),
            operations: role.operations.len(),
            description: role.description().to_string(),
        }
    }
}

impl Row for RoleRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "EXT ID", "TYPE", "OPERATIONS", "DESCRIPTION"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.ext_id.clone(),
            self.kind.clone(),
            self.operations.to_string(),
            self.description.clone(),
        ]
    }
}

/// Output roles in the specified format
pub fn output_roles(roles: &[Role], format: OutputFormat, no_header: bool) {
    let rows: Vec<RoleRow> = roles.iter().map(RoleRow::from).collect();
    render(&rows, format, no_header, "roles");
}

#[derive(Serialize)]
struct UserRow {
    ext_id: String,
    username: String,
    display_name: String,
    user_type: String,
    status: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            ext_id: user.ext_id.clone(),
            username: user.username.clone(),
            display_name: user.display_name().to_string(),
            user_type: user.user_type().to_string(),
            status: user.status().to_string(),
        }
    }
}

impl Row for UserRow {
    fn headers() -> &'static [&'static str] {
        &["USERNAME", "DISPLAY NAME", "TYPE", "STATUS", "EXT ID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.display_name.clone(),
            self.user_type.clone(),
            self.status.clone(),
            self.ext_id.clone(),
        ]
    }
}

/// Output users in the specified format
pub fn output_users(users: &[User], format: OutputFormat, no_header: bool) {
    let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
    render(&rows, format, no_header, "users");
}

#[derive(Serialize)]
struct PolicyRow {
    ext_id: String,
    name: String,
    policy_type: String,
    role: String,
    system_defined: bool,
}

impl From<&AuthorizationPolicy> for PolicyRow {
    fn from(policy: &AuthorizationPolicy) -> Self {
        Self {
            ext_id: policy.ext_id.clone(),
            name: policy.display_name.clone(),
            policy_type: policy.policy_type().to_string(),
            role: policy.role().to_string(),
            system_defined: policy.is_system_defined.unwrap_or(false),
        }
    }
}

impl Row for PolicyRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "TYPE", "ROLE", "SYSTEM", "EXT ID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.policy_type.clone(),
            self.role.clone(),
            yes_no(self.system_defined),
            self.ext_id.clone(),
        ]
    }
}

/// Output authorization policies in the specified format
pub fn output_policies(policies: &[AuthorizationPolicy], format: OutputFormat, no_header: bool) {
    let rows: Vec<PolicyRow> = policies.iter().map(PolicyRow::from).collect();
    render(&rows, format, no_header, "authorization policies");
}

#[derive(Serialize)]
struct OperationRow {
    ext_id: String,
    name: String,
    entity_type: String,
    description: String,
}

impl From<&Operation> for OperationRow {
    fn from(op: &Operation) -> Self {
        Self {
            ext_id: op.ext_id.clone(),
            name: op.display_name.clone(),
            entity_type: op.entity_type().to_string(),
            description: op.description().to_string(),
        }
    }
}

impl Row for OperationRow {
    fn headers() -> &'static [&'static str] {
        &["NAME", "ENTITY TYPE", "EXT ID", "DESCRIPTION"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.entity_type.clone(),
            self.ext_id.clone(),
            self.description.clone(),
        ]
    }
}

/// Output operations in the specified format
pub fn output_operations(operations: &[Operation], format: OutputFormat, no_header: bool) {
    let rows: Vec<OperationRow> = operations.iter().map(OperationRow::from).collect();
    render(&rows, format, no_header, "operations");
}

impl Row for ResolvedOperation {
    fn headers() -> &'static [&'static str] {
        &["OPERATION", "ENTITY TYPE", "EXT ID"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.display_name.clone(),
            self.entity_type.clone(),
            self.ext_id.clone(),
        ]
    }
}

/// Role with its operations resolved, for structured output
#[derive(Serialize)]
struct RoleDetails<'a> {
    #[serde(flatten)]
    role: RoleRow,
    client_name: &'a str,
    operation_details: &'a [ResolvedOperation],
}

/// Output a single role with its resolved operations
pub fn output_role_details(
    role: &Role,
    operations: &[ResolvedOperation],
    format: OutputFormat,
    no_header: bool,
) {
    match format {
        OutputFormat::Table => {
            println!("Name:        {}", role.display_name);
            println!("ExtId:       {}", role.ext_id);
            println!("Type:        {}", role.kind());
            println!("Client:      {}", role.client_name.as_deref().unwrap_or(""));
            println!("Description: {}", role.description());
            print!("{}", table_string(operations, no_header, "operations"));
        }
        OutputFormat::Csv => render(operations, format, no_header, "operations"),
        OutputFormat::Json | OutputFormat::Yaml => {
            let details = RoleDetails {
                role: RoleRow::from(role),
                client_name: role.client_name.as_deref().unwrap_or(""),
                operation_details: operations,
            };
            match format {
                OutputFormat::Json => super::common::print_json(&details),
                _ => super::common::print_yaml(&details),
            }
        }
    }
}
