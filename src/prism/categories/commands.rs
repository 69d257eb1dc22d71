//! Subnet and category command handlers

use log::warn;

use super::api::category_keys;
use super::models::{AssignOutcome, CategoryAssignment, V3Vm};
use crate::cli::{CategoryAction, Cli, Command, GetResource, OutputFormat};
use crate::output::{
    output_assign_outcomes, output_categories, output_category_keys, output_subnet_vms,
    output_subnets,
};
use crate::prism::traits::find_resource;
use crate::prism::{Fetcher, PrismClient, QuerySpec};
use crate::ui::{confirm_action, create_spinner, finish_spinner, update_spinner};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Run 'get subnets'
pub async fn run_subnets_command(client: &PrismClient, fetcher: &Fetcher, cli: &Cli) -> CommandResult {
    let Command::Get {
        resource: GetResource::Subnets(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let query = args.query.to_query_spec()?;
    let spinner = create_spinner("Fetching subnets...", cli.batch);
    let subnets = client.list_subnets(fetcher, &query).await?;
    finish_spinner(spinner);

    if subnets.is_empty() {
        eprintln!("No subnets found");
        return Ok(());
    }
    output_subnets(&subnets, args.output, cli.no_header);
    Ok(())
}

/// Run 'get categories'
pub async fn run_categories_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Get {
        resource: GetResource::Categories(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let query = args.query.to_query_spec()?;
    let spinner = create_spinner("Fetching categories...", cli.batch);
    let categories = match args.key {
        Some(ref key) => client.list_category_values(fetcher, key, &query).await?,
        None => client.list_categories(fetcher, &query).await?,
    };
    finish_spinner(spinner);

    if categories.is_empty() {
        match args.key {
            Some(ref key) => eprintln!("No values found for category '{}'", key),
            None => eprintln!("No categories found"),
        }
        return Ok(());
    }

    if args.keys_only {
        output_category_keys(&category_keys(&categories), args.output, cli.no_header);
    } else {
        output_categories(&categories, args.output, cli.no_header);
    }
    Ok(())
}

/// Run 'get subnet-vms SUBNET'
pub async fn run_subnet_vms_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Get {
        resource: GetResource::SubnetVms(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let spinner = create_spinner(&format!("Looking up subnet '{}'...", args.subnet), cli.batch);
    let subnets = client.list_subnets(fetcher, &QuerySpec::new()).await?;
    let subnet = find_resource(&subnets, &args.subnet)
        .ok_or_else(|| format!("Subnet '{}' not found", args.subnet))?;
    update_spinner(&spinner, &format!("Fetching VMs on '{}'...", subnet.name));
    let vms = client.list_subnet_vms(fetcher, &subnet.ext_id).await?;
    finish_spinner(spinner);

    if vms.is_empty() {
        eprintln!("No VMs found on subnet '{}'", subnet.name);
        return Ok(());
    }
    output_subnet_vms(&vms, args.output, cli.no_header);
    Ok(())
}

/// Run 'category assign KEY=VALUE'
pub async fn run_category_assign_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> CommandResult {
    let Command::Category {
        action: CategoryAction::Assign(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let assignment = CategoryAssignment::parse(&args.category)?;

    let spinner = create_spinner(&format!("Checking category {}...", assignment), cli.batch);
    let values = client
        .list_category_values(fetcher, &assignment.key, &QuerySpec::new())
        .await?;
    if !values.iter().any(|c| c.value == assignment.value) {
        finish_spinner(spinner);
        return Err(format!(
            "Category {} does not exist in Prism Central; create it first",
            assignment
        )
        .into());
    }

    let targets: Vec<V3Vm> = match args.subnet {
        Some(ref input) => {
            update_spinner(&spinner, &format!("Looking up subnet '{}'...", input));
            let subnets = client.list_subnets(fetcher, &QuerySpec::new()).await?;
            let subnet = find_resource(&subnets, input)
                .ok_or_else(|| format!("Subnet '{}' not found", input))?;
            update_spinner(&spinner, &format!("Fetching VMs on '{}'...", subnet.name));
            client.list_subnet_vms(fetcher, &subnet.ext_id).await?
        }
        None => {
            let mut targets = Vec::with_capacity(args.vms.len());
            for input in &args.vms {
                update_spinner(&spinner, &format!("Looking up VM '{}'...", input));
                let vm = client.find_vm(fetcher, input).await?;
                targets.push(V3Vm {
                    uuid: vm.ext_id.clone(),
                    name: vm.name.clone(),
                    power_state: vm.power_state().to_string(),
                });
            }
            targets
        }
    };
    finish_spinner(spinner);

    if targets.is_empty() {
        eprintln!("No VMs to update");
        return Ok(());
    }

    let prompt = format!("Assign {} to {} VM(s)?", assignment, targets.len());
    if !confirm_action(&prompt, args.yes || cli.batch)? {
        println!("Cancelled");
        return Ok(());
    }

    let spinner = create_spinner("Assigning category...", cli.batch);
    let mut outcomes = Vec::with_capacity(targets.len());
    for (i, vm) in targets.iter().enumerate() {
        update_spinner(
            &spinner,
            &format!("Assigning {} to '{}' ({}/{})...", assignment, vm.name, i + 1, targets.len()),
        );
        let outcome = match client.assign_category(&vm.uuid, &assignment).await {
            Ok(()) => AssignOutcome {
                vm: vm.name.clone(),
                uuid: vm.uuid.clone(),
                success: true,
                message: String::new(),
            },
            Err(e) => {
                warn!("Failed to assign {} to {}: {}", assignment, vm.name, e);
                AssignOutcome {
                    vm: vm.name.clone(),
                    uuid: vm.uuid.clone(),
                    success: false,
                    message: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }
    finish_spinner(spinner);

    output_assign_outcomes(&outcomes, args.output, cli.no_header);

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        return Err(format!(
            "Category {} assigned to {} of {} VMs ({} failed)",
            assignment,
            outcomes.len() - failed,
            outcomes.len(),
            failed
        )
        .into());
    }
    if args.output == OutputFormat::Table {
        println!("✓ Category {} assigned to {} VMs", assignment, outcomes.len());
    }
    Ok(())
}
