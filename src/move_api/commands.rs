//! Move command handlers

use log::{debug, warn};

use super::api::PrepareOptions;
use super::credential_map::CredentialMap;
use super::models::{PlanWorkload, Provider};
use super::plan::{
    collect_source_networks, default_plan_name, plan_payload, resolve_network_mappings,
    select_placement, select_vms, source_info, target_info,
};
use super::MoveClient;
use crate::cli::{
    Cli, Command, CreatePlanArgs, MoveAction, PrepMode, PrepareArgs, WorkloadActionArgs,
};
use crate::config::move_api;
use crate::error::PrismError;
use crate::output::{
    output_move_workloads, output_plan_workloads, output_plans, output_providers,
    output_readiness,
};
use crate::prism::traits::find_resource;
use crate::prism::{Fetcher, QuerySpec};
use crate::ui::{
    confirm_cutover, create_spinner, finish_spinner, update_spinner, CutoverSummary,
};

type CommandResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Characters of a guest preparation script shown inline
const SCRIPT_PREVIEW_CHARS: usize = 500;

/// Run every 'move' subcommand
pub async fn run_move_command(client: &MoveClient, fetcher: &Fetcher, cli: &Cli) -> CommandResult {
    let Command::Move { action, .. } = &cli.command else {
        unreachable!()
    };

    match action {
        MoveAction::Providers(args) => {
            let spinner = create_spinner("Fetching providers...", cli.batch);
            let providers = client.list_providers().await?;
            finish_spinner(spinner);

            if providers.is_empty() {
                eprintln!("No providers found");
                return Ok(());
            }
            output_providers(&providers, args.output, cli.no_header);
        }
        MoveAction::Workloads(args) => {
            let mut query = QuerySpec::new().with_page_size(args.page_size);
            if let Some(ref search) = args.query {
                query = query.with_filter(search.clone());
            }

            let spinner = create_spinner("Fetching providers...", cli.batch);
            let provider = find_listed_provider(client, &args.provider).await?;
            update_spinner(
                &spinner,
                &format!("Fetching workloads of '{}'...", provider.spec.name),
            );
            let vms = client
                .list_workloads(fetcher, &provider.metadata.uuid, args.refresh, &query)
                .await?;
            finish_spinner(spinner);

            if vms.is_empty() {
                eprintln!("No workloads found");
                return Ok(());
            }
            output_move_workloads(&vms, args.output, cli.no_header);
        }
        MoveAction::Plans(args) => {
            let spinner = create_spinner("Fetching plans...", cli.batch);
            let plans = client.list_plans().await?;
            finish_spinner(spinner);

            if plans.is_empty() {
                eprintln!("No plans found");
                return Ok(());
            }
            output_plans(&plans, args.output, cli.no_header);
        }
        MoveAction::PlanWorkloads(args) => {
            let spinner = create_spinner(&format!("Looking up plan '{}'...", args.plan), cli.batch);
            let plan = client.find_plan(&args.plan).await?;
            update_spinner(&spinner, "Fetching plan workloads...");
            let workloads = client.plan_workloads(&plan.metadata.uuid).await?;
            finish_spinner(spinner);

            if workloads.is_empty() {
                eprintln!("No workloads found in plan '{}'", plan.metadata.name);
                return Ok(());
            }
            output_plan_workloads(&workloads, args.output, cli.no_header);
        }
        MoveAction::CreatePlan(args) => create_plan(client, fetcher, args, cli.batch).await?,
        MoveAction::Prepare(args) => {
            let spinner = create_spinner(&format!("Looking up plan '{}'...", args.plan), cli.batch);
            let plan = client.find_plan(&args.plan).await?;
            let vms = client.plan_vm_references(&plan.metadata.uuid).await?;
            if vms.is_empty() {
                finish_spinner(spinner);
                return Err(format!("Plan '{}' has no VMs to prepare", plan.metadata.name).into());
            }
            let options = prepare_options(args);
            if options.skip_ip_retention {
                warn!("Guest IP configuration will not be retained on the target");
            }
            update_spinner(
                &spinner,
                &format!("Preparing {} VMs ({} mode)...", vms.len(), args.mode.as_api_str()),
            );
            let scripts = client
                .prepare_plan(&plan.metadata.uuid, args.mode, options, &vms)
                .await?;
            finish_spinner(spinner);

            println!(
                "✓ Prepare submitted for {} VMs of plan '{}'",
                vms.len(),
                plan.metadata.name
            );
            if args.mode == PrepMode::Manual && !scripts.is_empty() {
                println!("\nRun the following scripts on the source VMs before starting the plan:");
                if let Some(ref script) = scripts.linux {
                    println!("\nLinux:\n{}", preview(script));
                }
                if let Some(ref script) = scripts.windows {
                    println!("\nWindows:\n{}", preview(script));
                }
            }
        }
        MoveAction::Readiness(args) => {
            let spinner = create_spinner(&format!("Looking up plan '{}'...", args.plan), cli.batch);
            let plan = client.find_plan(&args.plan).await?;
            update_spinner(&spinner, "Running readiness checks...");
            let report = client.check_readiness(&plan.metadata.uuid).await?;
            finish_spinner(spinner);

            output_readiness(&report, cli.no_header);
            if !report.is_ready() {
                return Err(PrismError::Workflow(format!(
                    "Plan '{}' failed {} readiness check(s)",
                    plan.metadata.name,
                    report.failed.len()
                ))
                .into());
            }
            println!("✓ Plan '{}' is ready to migrate", plan.metadata.name);
        }
        MoveAction::Start(args) => {
            let spinner = create_spinner(&format!("Looking up plan '{}'...", args.plan), cli.batch);
            let plan = client.find_plan(&args.plan).await?;
            update_spinner(&spinner, &format!("Starting plan '{}'...", plan.metadata.name));
            client.start_plan(&plan.metadata.uuid, args.frequency).await?;
            finish_spinner(spinner);

            match args.frequency {
                Some(minutes) => println!(
                    "✓ Plan '{}' started (snapshot every {} minutes)",
                    plan.metadata.name, minutes
                ),
                None => println!("✓ Plan '{}' started", plan.metadata.name),
            }
        }
        MoveAction::Action(args) => workload_action(client, args, cli.batch).await?,
    }
    Ok(())
}

/// Provider from the list call, matched by UUID or name
async fn find_listed_provider(client: &MoveClient, input: &str) -> Result<Provider, PrismError> {
    let providers = client.list_providers().await?;
    find_resource(&providers, input)
        .cloned()
        .ok_or_else(|| PrismError::Validation(format!("Provider '{}' not found", input)))
}

/// Prepare options from the command line flags
fn prepare_options(args: &PrepareArgs) -> PrepareOptions {
    PrepareOptions {
        install_ngt: !args.no_install_ngt,
        uninstall_guest_tools: !args.keep_guest_tools,
        skip_ip_retention: args.skip_ip_retention,
    }
}

fn preview(script: &str) -> String {
    if script.chars().count() <= SCRIPT_PREVIEW_CHARS {
        return script.to_string();
    }
    let shown: String = script.chars().take(SCRIPT_PREVIEW_CHARS).collect();
    format!("{}...", shown)
}

async fn create_plan(
    client: &MoveClient,
    fetcher: &Fetcher,
    args: &CreatePlanArgs,
    batch: bool,
) -> CommandResult {
    let credentials = match args.credentials {
        Some(ref path) => CredentialMap::from_path(path)?,
        None => {
            warn!("No credential mapping given; VMs will have no guest credentials");
            CredentialMap::default()
        }
    };

    let spinner = create_spinner("Looking up providers...", batch);
    let source = client.find_provider(&args.source).await?;
    let target = client.find_provider(&args.target).await?;
    debug!(
        "Source {} ({}), target {} ({})",
        source.spec.name,
        source.provider_type(),
        target.spec.name,
        target.provider_type()
    );
    let (placement, target_cluster) = select_placement(
        &target,
        args.target_cluster.as_deref(),
        args.target_container.as_deref(),
    )?;

    update_spinner(&spinner, &format!("Fetching workloads of '{}'...", source.spec.name));
    let inventory = client
        .list_workloads(
            fetcher,
            &source.metadata.uuid,
            false,
            &QuerySpec::new().with_page_size(move_api::DEFAULT_PAGE_SIZE),
        )
        .await?;
    finish_spinner(spinner);

    let (vms, missing) = select_vms(&inventory, &args.vms);
    for name in &missing {
        warn!("VM '{}' not found on provider '{}'", name, source.spec.name);
    }
    if vms.is_empty() {
        return Err(PrismError::Validation(format!(
            "None of the requested VMs were found on provider '{}'",
            source.spec.name
        ))
        .into());
    }

    let source_networks = collect_source_networks(&vms);
    let target_networks = target_cluster.map(|c| c.networks.as_slice()).unwrap_or(&[]);
    let mappings = resolve_network_mappings(
        &args.network_maps,
        args.auto_map_networks,
        &source_networks,
        target_networks,
    )?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| default_plan_name(&chrono::Local::now()));
    let (payload, with_credentials) = plan_payload(
        &name,
        source_info(&source),
        target_info(&target, &placement),
        &vms,
        &credentials,
        &mappings,
    );
    println!(
        "Plan '{}': {} VMs ({} with guest credentials), {} network mapping(s)",
        name,
        vms.len(),
        with_credentials,
        mappings.len()
    );

    let spinner = create_spinner(&format!("Creating plan '{}'...", name), batch);
    let uuid = client.create_plan(&payload).await?;
    update_spinner(&spinner, "Verifying plan...");
    let plans = client.list_plans().await?;
    finish_spinner(spinner);

    match plans.iter().find(|p| p.metadata.uuid == uuid) {
        Some(plan) => println!(
            "✓ Plan '{}' created ({}), state {}",
            plan.metadata.name,
            uuid,
            plan.metadata.state()
        ),
        None => {
            warn!("Plan {} not found in the plan list after creation", uuid);
            println!("✓ Plan '{}' created ({})", name, uuid);
        }
    }
    if !missing.is_empty() {
        println!("  {} requested VM(s) not found: {}", missing.len(), missing.join(", "));
    }
    Ok(())
}

async fn workload_action(client: &MoveClient, args: &WorkloadActionArgs, batch: bool) -> CommandResult {
    let action = args.action.trim().to_lowercase();
    if action.is_empty() {
        return Err(PrismError::Validation("Action must not be empty".to_string()).into());
    }

    let spinner = create_spinner(&format!("Looking up plan '{}'...", args.plan), batch);
    let plan = client.find_plan(&args.plan).await?;
    let workloads = client.plan_workloads(&plan.metadata.uuid).await?;
    finish_spinner(spinner);

    let workload: &PlanWorkload = find_resource(&workloads, &args.workload).ok_or_else(|| {
        PrismError::Validation(format!(
            "Workload '{}' not found in plan '{}'",
            args.workload, plan.metadata.name
        ))
    })?;

    if action == "cutover" {
        let summary = CutoverSummary::new(&plan.metadata.name, vec![workload.metadata.name.clone()]);
        if !confirm_cutover(&summary, args.yes, batch)? {
            if batch {
                return Err(PrismError::Workflow("Cutover not confirmed".to_string()).into());
            }
            println!("Cancelled");
            return Ok(());
        }
    }

    let spinner = create_spinner(
        &format!("Submitting {} for '{}'...", action, workload.metadata.name),
        batch,
    );
    client
        .workload_action(&plan.metadata.uuid, &workload.metadata.uuid, &action)
        .await?;
    finish_spinner(spinner);

    println!(
        "✓ {} submitted for workload '{}' of plan '{}'",
        action, workload.metadata.name, plan.metadata.name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_scripts() {
        assert_eq!(preview("echo hi"), "echo hi");
        let long = "x".repeat(SCRIPT_PREVIEW_CHARS + 10);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.len(), SCRIPT_PREVIEW_CHARS + 3);
    }

    fn prepare_args(extra: &[&str]) -> PrepareArgs {
        use clap::Parser;
        let mut argv = vec!["prismctl", "move", "prepare", "plan-a"];
        argv.extend_from_slice(extra);
        let Command::Move {
            action: MoveAction::Prepare(args),
            ..
        } = Cli::parse_from(argv).command
        else {
            panic!("expected move prepare");
        };
        args
    }

    #[test]
    fn test_prepare_options_retain_ip_by_default() {
        let options = prepare_options(&prepare_args(&[]));
        assert_eq!(options, PrepareOptions::default());
        assert!(!options.skip_ip_retention);
        assert!(options.install_ngt);
        assert!(options.uninstall_guest_tools);
    }

    #[test]
    fn test_prepare_options_from_flags() {
        let options = prepare_options(&prepare_args(&[
            "--no-install-ngt",
            "--keep-guest-tools",
            "--skip-ip-retention",
        ]));
        assert!(!options.install_ngt);
        assert!(!options.uninstall_guest_tools);
        assert!(options.skip_ip_retention);
    }
}
