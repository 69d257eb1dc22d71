//! IAM command handlers

use log::{debug, info};

use super::helpers::{
    merge_operations, resolve_operations, user_search_filter, validate_role,
    view_only_operation_ids,
};
use super::models::{Operation, Role};
use crate::cli::{Cli, Command, GetResource, RoleAction};
use crate::output::{
    output_operations, output_policies, output_role_details, output_roles, output_users,
};
use crate::prism::traits::find_resource;
use crate::prism::{Fetcher, PrismClient, QuerySpec};
use crate::ui::{confirm_action, create_spinner, finish_spinner, update_spinner};

type CommandResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Run 'get roles'
pub async fn run_roles_command(client: &PrismClient, fetcher: &Fetcher, cli: &Cli) -> CommandResult {
    let Command::Get {
        resource: GetResource::Roles(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let query = args.query.to_query_spec()?;
    let spinner = create_spinner("Fetching roles...", cli.batch);
    let roles = client.list_roles(fetcher, &query).await?;
    finish_spinner(spinner);

    if roles.is_empty() {
        eprintln!("No roles found");
        return Ok(());
    }
    output_roles(&roles, args.output, cli.no_header);
    Ok(())
}

/// Run 'get role NAME'
pub async fn run_role_command(client: &PrismClient, fetcher: &Fetcher, cli: &Cli) -> CommandResult {
    let Command::Get {
        resource: GetResource::Role(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let spinner = create_spinner(&format!("Looking up role '{}'...", args.role), cli.batch);
    let role = find_role(client, fetcher, &args.role).await?;
    update_spinner(&spinner, &format!("Fetching role '{}'...", role.display_name));
    let (role, _, _) = client.get_role(fetcher, &role.ext_id).await?;
    update_spinner(&spinner, "Fetching operations catalogue...");
    let catalogue = client.list_operations(fetcher, &QuerySpec::new()).await?;
    finish_spinner(spinner);

    let resolved = resolve_operations(&role.operations, &catalogue);
    output_role_details(&role, &resolved, args.output, cli.no_header);
    Ok(())
}

/// Run 'get users'
pub async fn run_users_command(client: &PrismClient, fetcher: &Fetcher, cli: &Cli) -> CommandResult {
    let Command::Get {
        resource: GetResource::Users(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let mut query = args.query.to_query_spec()?;
    if let Some(ref term) = args.search {
        query = query.with_filter(user_search_filter(term));
        debug!("User search filter: {:?}", query.filter);
    }

    let spinner = create_spinner("Fetching users...", cli.batch);
    let users = client.list_users(fetcher, &query).await?;
    finish_spinner(spinner);

    if users.is_empty() {
        match args.search {
            Some(ref term) => eprintln!("No users found matching '{}'", term),
            None => eprintln!("No users found"),
        }
        return Ok(());
    }
    output_users(&users, args.output, cli.no_header);
    Ok(())
}

/// Run 'get user-policies USER'
pub async fn run_user_policies_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Get {
        resource: GetResource::UserPolicies(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let spinner = create_spinner(&format!("Looking up user '{}'...", args.user), cli.batch);
    let query = QuerySpec::new().with_filter(format!(
        "username eq '{}'",
        args.user.replace('\'', "''")
    ));
    let users = client.list_users(fetcher, &query).await?;
    let needles: Vec<String> = match users.first() {
        Some(user) => vec![user.ext_id.clone(), user.username.clone()],
        None => {
            info!("No user named '{}', treating it as an ExtId", args.user);
            vec![args.user.clone()]
        }
    };

    update_spinner(&spinner, "Fetching authorization policies...");
    let mut policies = client
        .list_authorization_policies(fetcher, &QuerySpec::new())
        .await?;
    finish_spinner(spinner);

    let needles: Vec<&str> = needles.iter().map(String::as_str).collect();
    policies.retain(|policy| policy.mentions_identity(&needles));
    debug!("{} policies reference {:?}", policies.len(), needles);

    if policies.is_empty() {
        eprintln!("No authorization policies found for user '{}'", args.user);
        return Ok(());
    }
    output_policies(&policies, args.output, cli.no_header);
    Ok(())
}

/// Run 'get policies'
pub async fn run_policies_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Get {
        resource: GetResource::Policies(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let query = args.query.to_query_spec()?;
    let spinner = create_spinner("Fetching authorization policies...", cli.batch);
    let policies = client.list_authorization_policies(fetcher, &query).await?;
    finish_spinner(spinner);

    if policies.is_empty() {
        eprintln!("No authorization policies found");
        return Ok(());
    }
    output_policies(&policies, args.output, cli.no_header);
    Ok(())
}

/// Run 'get operations'
pub async fn run_operations_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Get {
        resource: GetResource::Operations(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let query = args.query.to_query_spec()?;
    let spinner = create_spinner("Fetching operations...", cli.batch);
    let mut operations = client.list_operations(fetcher, &query).await?;
    finish_spinner(spinner);

    if args.view_only {
        let view_only = view_only_operation_ids(&operations);
        operations.retain(|op| view_only.contains(&op.ext_id));
    }

    if operations.is_empty() {
        eprintln!("No operations found");
        return Ok(());
    }
    output_operations(&operations, args.output, cli.no_header);
    Ok(())
}

/// Run 'role create' and 'role add-view-only'
pub async fn run_role_action_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Role { action } = &cli.command else {
        unreachable!()
    };

    match action {
        RoleAction::Create(args) => {
            let spinner = create_spinner("Fetching operations catalogue...", cli.batch);
            let catalogue = client.list_operations(fetcher, &QuerySpec::new()).await?;
            finish_spinner(spinner);

            let mut operations = resolve_operation_inputs(&args.operations, &catalogue)?;
            if args.view_only {
                let (merged, added) =
                    merge_operations(&operations, &view_only_operation_ids(&catalogue));
                println!("Including {} view-only operations", added);
                operations = merged;
            }
            validate_role(&args.name, args.description.as_deref(), &operations)?;

            let prompt = format!(
                "Create role '{}' with {} operations?",
                args.name,
                operations.len()
            );
            if !confirm_action(&prompt, args.yes || cli.batch)? {
                println!("Cancelled");
                return Ok(());
            }

            let spinner = create_spinner(&format!("Creating role '{}'...", args.name), cli.batch);
            let role = client
                .create_role(fetcher, &args.name, args.description.as_deref(), &operations)
                .await?;
            finish_spinner(spinner);

            println!(
                "✓ Role '{}' created ({}) with {} operations",
                role.display_name,
                role.ext_id,
                operations.len()
            );
        }
        RoleAction::AddViewOnly(args) => {
            let spinner = create_spinner(&format!("Looking up role '{}'...", args.role), cli.batch);
            let role = find_role(client, fetcher, &args.role).await?;
            let (role, raw, etag) = client.get_role(fetcher, &role.ext_id).await?;
            update_spinner(&spinner, "Fetching operations catalogue...");
            let catalogue = client.list_operations(fetcher, &QuerySpec::new()).await?;
            finish_spinner(spinner);

            if role.is_system_defined() {
                return Err(format!(
                    "Role '{}' is system defined and cannot be modified",
                    role.display_name
                )
                .into());
            }

            let view_only = view_only_operation_ids(&catalogue);
            let (merged, added) = merge_operations(&role.operations, &view_only);
            println!(
                "Found {} view-only operations; role '{}' already has {}",
                view_only.len(),
                role.display_name,
                view_only.len() - added
            );
            if added == 0 {
                println!("Role already has all available view-only operations.");
                return Ok(());
            }
            validate_role(&role.display_name, role.description.as_deref(), &merged)?;

            let prompt = format!(
                "Add {} view-only operations to role '{}'?",
                added, role.display_name
            );
            if !confirm_action(&prompt, args.yes || cli.batch)? {
                println!("Cancelled");
                return Ok(());
            }

            let spinner = create_spinner(
                &format!("Updating role '{}'...", role.display_name),
                cli.batch,
            );
            let updated = client
                .update_role_operations(fetcher, &role.ext_id, &raw, etag.as_deref(), &merged)
                .await?;
            finish_spinner(spinner);

            println!(
                "✓ Role '{}' updated: {} operations ({} added)",
                updated.display_name,
                merged.len(),
                added
            );
        }
    }
    Ok(())
}

/// Find a role by ExtId or display name
async fn find_role(
    client: &PrismClient,
    fetcher: &Fetcher,
    input: &str,
) -> std::result::Result<Role, Box<dyn std::error::Error>> {
    let roles = client.list_roles(fetcher, &QuerySpec::new()).await?;
    find_resource(&roles, input)
        .cloned()
        .ok_or_else(|| format!("Role '{}' not found", input).into())
}

/// Map operation names or ExtIds to ExtIds, in input order
fn resolve_operation_inputs(
    inputs: &[String],
    catalogue: &[Operation],
) -> std::result::Result<Vec<String>, String> {
    inputs
        .iter()
        .map(|input| {
            find_resource(catalogue, input)
                .map(|op| op.ext_id.clone())
                .ok_or_else(|| format!("Operation '{}' not found in the catalogue", input))
        })
        .collect()
}
