//! Pure IAM helpers: search filters, role validation, view-only detection

use std::collections::{BTreeSet, HashMap};

use serde_json::{json, Value};

use super::models::{Operation, ResolvedOperation};
use crate::error::{PrismError, Result};

/// Characters the roles API rejects in a display name
const FORBIDDEN_NAME_CHARS: &[char] = &['<', '>', ';', '\'', '(', ')', '&', '+', '%', '/', '\\', '`'];

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_OPERATIONS: usize = 2000;

/// Keywords marking an operation as read-only
const VIEW_KEYWORDS: &[&str] = &[
    "view", "get", "list", "read", "show", "display", "fetch", "query", "search", "browse",
    "inspect",
];

/// Keywords marking an operation as mutating
const MODIFY_KEYWORDS: &[&str] = &[
    "create", "update", "delete", "modify", "add", "remove", "set", "change", "edit", "write",
];

/// Fields the server owns and rejects on role update
const READ_ONLY_ROLE_FIELDS: &[&str] = &[
    "extId",
    "createdTime",
    "lastUpdatedTime",
    "createdBy",
    "lastUpdatedBy",
    "accessibleClients",
    "accessibleEntityTypes",
    "accessibleClientsCount",
    "accessibleEntityTypesCount",
    "assignedUsersCount",
    "assignedUserGroupsCount",
    "isSystemDefined",
    "links",
];

/// Label for operation IDs missing from the catalogue
pub const UNKNOWN_OPERATION: &str = "Unknown Operation";

/// OData filter matching users whose username or display name contains `term`
pub fn user_search_filter(term: &str) -> String {
    let escaped = term.replace('\'', "''");
    ["username", "displayName"]
        .iter()
        .flat_map(|field| {
            [
                format!("startswith({}, '{}')", field, escaped),
                format!("contains({}, '{}')", field, escaped),
            ]
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Check a role before it is sent to the server
pub fn validate_role(name: &str, description: Option<&str>, operations: &[String]) -> Result<()> {
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(PrismError::Validation(format!(
            "Role name contains invalid character '{}'. Avoid: < > ; ' ( ) & + % / \\ `",
            c
        )));
    }
    let name_len = name.chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(PrismError::Validation(format!(
            "Role name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(PrismError::Validation(format!(
            "Description must be {} characters or less",
            MAX_DESCRIPTION_LEN
        )));
    }
    if operations.is_empty() {
        return Err(PrismError::Validation(
            "At least one operation must be selected".to_string(),
        ));
    }
    if operations.len() > MAX_OPERATIONS {
        return Err(PrismError::Validation(format!(
            "Maximum {} operations allowed per role (got {})",
            MAX_OPERATIONS,
            operations.len()
        )));
    }
    Ok(())
}

/// Request body for role creation
pub fn role_create_payload(name: &str, description: Option<&str>, operations: &[String]) -> Value {
    let mut body = json!({
        "displayName": name,
        "operations": operations,
    });
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        body["description"] = Value::String(description.to_string());
    }
    body
}

/// Whether an operation only reads state
pub fn is_view_only(operation: &Operation) -> bool {
    let name = operation.display_name.to_lowercase();
    if VIEW_KEYWORDS.iter().any(|k| name.contains(k)) {
        return true;
    }
    let description = operation.description().to_lowercase();
    VIEW_KEYWORDS.iter().any(|k| description.contains(k))
        && !MODIFY_KEYWORDS
            .iter()
            .any(|k| name.contains(k) || description.contains(k))
}

/// ExtIds of every view-only operation, in catalogue order
pub fn view_only_operation_ids(catalogue: &[Operation]) -> Vec<String> {
    catalogue
        .iter()
        .filter(|op| is_view_only(op))
        .map(|op| op.ext_id.clone())
        .collect()
}

/// Operations to add so that `current` contains every view-only operation
///
/// Returns the merged list (current order first, additions after) and the
/// number of added operations.
pub fn merge_operations(current: &[String], additions: &[String]) -> (Vec<String>, usize) {
    let mut seen: BTreeSet<&str> = current.iter().map(String::as_str).collect();
    let mut merged = current.to_vec();
    let mut added = 0;
    for op in additions {
        if seen.insert(op.as_str()) {
            merged.push(op.clone());
            added += 1;
        }
    }
    (merged, added)
}

/// Role update body: the current role minus server-owned fields, new operations
pub fn role_update_payload(current: &Value, operations: &[String]) -> Result<Value> {
    let mut body = match current {
        Value::Object(map) => map.clone(),
        _ => {
            return Err(PrismError::Json(
                "Role details are not a JSON object".to_string(),
            ))
        }
    };
    for field in READ_ONLY_ROLE_FIELDS {
        body.remove(*field);
    }
    body.insert("operations".to_string(), json!(operations));
    Ok(Value::Object(body))
}

/// Resolve operation IDs to catalogue entries
pub fn resolve_operations(ids: &[String], catalogue: &[Operation]) -> Vec<ResolvedOperation> {
    let by_id: HashMap<&str, &Operation> =
        catalogue.iter().map(|op| (op.ext_id.as_str(), op)).collect();
    ids.iter()
        .map(|id| match by_id.get(id.as_str()) {
            Some(op) => ResolvedOperation {
                ext_id: id.clone(),
                display_name: op.display_name.clone(),
                entity_type: op.entity_type().to_string(),
            },
            None => ResolvedOperation {
                ext_id: id.clone(),
                display_name: UNKNOWN_OPERATION.to_string(),
                entity_type: String::new(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(id: &str, name: &str, description: &str) -> Operation {
        Operation {
            ext_id: id.to_string(),
            display_name: name.to_string(),
            description: Some(description.to_string()),
            ..Operation::default()
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_user_search_filter() {
        assert_eq!(
            user_search_filter("jdoe"),
            "startswith(username, 'jdoe') or contains(username, 'jdoe') or \
             startswith(displayName, 'jdoe') or contains(displayName, 'jdoe')"
        );
    }

    #[test]
    fn test_user_search_filter_escapes_quotes() {
        assert!(user_search_filter("o'brien").contains("'o''brien'"));
    }

    #[test]
    fn test_validate_role_ok() {
        assert!(validate_role("Ops Viewer", Some("read only"), &ids(&["op-1"])).is_ok());
    }

    #[test]
    fn test_validate_role_rejects_forbidden_chars() {
        for name in ["a<b", "a;b", "a/b", "a`b", "it's"] {
            let err = validate_role(name, None, &ids(&["op-1"])).unwrap_err();
            assert!(matches!(err, PrismError::Validation(_)), "{}", name);
        }
    }

    #[test]
    fn test_validate_role_name_length() {
        assert!(validate_role("", None, &ids(&["op-1"])).is_err());
        assert!(validate_role(&"x".repeat(255), None, &ids(&["op-1"])).is_ok());
        assert!(validate_role(&"x".repeat(256), None, &ids(&["op-1"])).is_err());
    }

    #[test]
    fn test_validate_role_description_length() {
        let long = "d".repeat(1001);
        assert!(validate_role("r", Some(&long), &ids(&["op-1"])).is_err());
    }

    #[test]
    fn test_validate_role_operation_count() {
        assert!(validate_role("r", None, &[]).is_err());
        let many: Vec<String> = (0..2001).map(|i| format!("op-{}", i)).collect();
        let err = validate_role("r", None, &many).unwrap_err();
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn test_role_create_payload() {
        let body = role_create_payload("r", None, &ids(&["op-1"]));
        assert_eq!(body["displayName"], "r");
        assert_eq!(body["operations"][0], "op-1");
        assert!(body.get("description").is_none());

        let body = role_create_payload("r", Some("desc"), &ids(&["op-1"]));
        assert_eq!(body["description"], "desc");
    }

    #[test]
    fn test_is_view_only_by_name() {
        assert!(is_view_only(&op("1", "View_VM", "")));
        assert!(is_view_only(&op("2", "List Clusters", "")));
        // A view keyword in the name wins even if the description mutates
        assert!(is_view_only(&op("3", "Get_Task", "update task status")));
    }

    #[test]
    fn test_is_view_only_by_description() {
        assert!(is_view_only(&op("1", "Cluster_Info", "Allows to browse clusters")));
        assert!(!is_view_only(&op("2", "Power_Op", "Shows and changes power state")));
        assert!(!is_view_only(&op("3", "Delete_VM", "Delete a VM")));
    }

    #[test]
    fn test_view_only_operation_ids() {
        let catalogue = vec![
            op("1", "View_VM", ""),
            op("2", "Delete_VM", "Delete a VM"),
            op("3", "Search_Images", ""),
        ];
        assert_eq!(view_only_operation_ids(&catalogue), ids(&["1", "3"]));
    }

    #[test]
    fn test_merge_operations() {
        let (merged, added) = merge_operations(&ids(&["a", "b"]), &ids(&["b", "c", "c", "d"]));
        assert_eq!(merged, ids(&["a", "b", "c", "d"]));
        assert_eq!(added, 2);
    }

    #[test]
    fn test_role_update_payload_strips_read_only_fields() {
        let current = json!({
            "extId": "r-1",
            "displayName": "Ops",
            "description": "d",
            "operations": ["a"],
            "createdTime": "2024-01-01",
            "isSystemDefined": false,
            "assignedUsersCount": 3,
            "links": [],
            "clientName": "prism"
        });
        let body = role_update_payload(&current, &ids(&["a", "b"])).unwrap();
        assert_eq!(body["displayName"], "Ops");
        assert_eq!(body["clientName"], "prism");
        assert_eq!(body["operations"], json!(["a", "b"]));
        for field in ["extId", "createdTime", "isSystemDefined", "assignedUsersCount", "links"] {
            assert!(body.get(field).is_none(), "{} should be stripped", field);
        }
    }

    #[test]
    fn test_role_update_payload_requires_object() {
        assert!(role_update_payload(&json!([]), &[]).is_err());
    }

    #[test]
    fn test_resolve_operations_unknown() {
        let catalogue = vec![op("op-1", "View_VM", "")];
        let resolved = resolve_operations(&ids(&["op-1", "op-x"]), &catalogue);
        assert_eq!(resolved[0].display_name, "View_VM");
        assert_eq!(resolved[1].display_name, UNKNOWN_OPERATION);
        assert_eq!(resolved[1].ext_id, "op-x");
    }
}
