//! NGT command handlers

use std::time::Duration;

use log::{info, warn};

use super::api::{install_payload, insert_iso_payload, GuestCredential, GuestToolsAction};
use super::models::{NgtReport, NgtStatus};
use crate::cli::{Cli, Command, NgtAction, NgtInstallArgs};
use crate::config::defaults;
use crate::error::{PrismError, Result};
use crate::output::output_ngt_report;
use crate::prism::credentials::{prompt_password, prompt_text};
use crate::prism::{Fetcher, PrismClient};
use crate::ui::{create_spinner, finish_spinner, update_spinner};

/// Run 'ngt status' and 'ngt install'
pub async fn run_ngt_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let Command::Ngt { action } = &cli.command else {
        unreachable!()
    };

    match action {
        NgtAction::Status(args) => {
            let spinner = create_spinner(&format!("Looking up VM '{}'...", args.vm), cli.batch);
            let vm = client.find_vm(fetcher, &args.vm).await?;
            update_spinner(&spinner, &format!("Reading guest tools of '{}'...", vm.name));
            let snapshot = client.get_guest_tools(fetcher, &vm.ext_id).await?;
            finish_spinner(spinner);

            let report = NgtReport::new(&vm.name, &vm.ext_id, &snapshot.tools);
            output_ngt_report(&report, args.output, cli.no_header);
        }
        NgtAction::Install(args) => install(client, fetcher, args, cli.batch).await?,
    }
    Ok(())
}

async fn install(
    client: &PrismClient,
    fetcher: &Fetcher,
    args: &NgtInstallArgs,
    batch: bool,
) -> Result<()> {
    let spinner = create_spinner(&format!("Looking up VM '{}'...", args.vm), batch);
    let vm = client.find_vm(fetcher, &args.vm).await?;
    update_spinner(&spinner, &format!("Reading guest tools of '{}'...", vm.name));
    let snapshot = client.get_guest_tools(fetcher, &vm.ext_id).await?;
    finish_spinner(spinner);

    let status = NgtStatus::classify(Some(&snapshot.tools));
    info!("VM '{}' ({}) NGT status: {}", vm.name, vm.ext_id, status.as_str());
    if status == NgtStatus::InstalledEnabled && !args.force {
        println!(
            "✓ NGT {} is already installed and enabled on '{}'",
            snapshot.tools.version(),
            vm.name
        );
        return Ok(());
    }

    let credential = guest_credential(args, batch)?;
    let poll = Duration::from_secs(defaults::TASK_POLL_SECS);

    let spinner = create_spinner(&format!("Mounting NGT ISO on '{}'...", vm.name), batch);
    let iso_task = client
        .guest_tools_action(fetcher, &vm.ext_id, GuestToolsAction::InsertIso, &insert_iso_payload())
        .await?;
    if let Some(ref task) = iso_task {
        update_spinner(&spinner, "Waiting for the ISO to be mounted...");
        client
            .wait_for_task(task, Duration::from_secs(defaults::ISO_TASK_TIMEOUT_SECS), poll)
            .await?;
    }

    update_spinner(&spinner, &format!("Installing NGT on '{}'...", vm.name));
    let install_task = client
        .guest_tools_action(
            fetcher,
            &vm.ext_id,
            GuestToolsAction::Install,
            &install_payload(&credential, args.reboot),
        )
        .await?;

    let Some(task) = install_task else {
        finish_spinner(spinner);
        println!("✓ NGT installation accepted for '{}'", vm.name);
        return Ok(());
    };
    if args.no_wait {
        finish_spinner(spinner);
        println!("✓ NGT installation submitted for '{}' (task {})", vm.name, task);
        return Ok(());
    }

    update_spinner(&spinner, &format!("Waiting for installation task {}...", task));
    client
        .wait_for_task(&task, Duration::from_secs(args.task_timeout), poll)
        .await?;
    update_spinner(&spinner, "Verifying installation...");
    let verified = client.get_guest_tools(fetcher, &vm.ext_id).await?;
    finish_spinner(spinner);

    match NgtStatus::classify(Some(&verified.tools)) {
        NgtStatus::InstalledEnabled => {
            println!("✓ NGT {} installed and enabled on '{}'", verified.tools.version(), vm.name)
        }
        NgtStatus::InstalledDisabled => println!(
            "✓ NGT installed on '{}' (not yet enabled{})",
            vm.name,
            if args.reboot { "" } else { "; a reboot may be required" }
        ),
        other => {
            warn!("Installation task finished but NGT status is {}", other.as_str());
            return Err(PrismError::Workflow(format!(
                "NGT installation task {} finished but '{}' reports status {}",
                task,
                vm.name,
                other.as_str()
            )));
        }
    }
    Ok(())
}

/// Guest credentials from flags or environment, else prompted for
fn guest_credential(args: &NgtInstallArgs, batch: bool) -> Result<GuestCredential> {
    let username = match args.guest_username.clone().filter(|u| !u.is_empty()) {
        Some(username) => username,
        None if batch => {
            return Err(PrismError::Credentials(
                "No guest username provided. Use --guest-username or set NGT_GUEST_USERNAME"
                    .to_string(),
            ))
        }
        None => prompt_text("Guest OS username")?,
    };
    let password = match args.guest_password.clone().filter(|p| !p.is_empty()) {
        Some(password) => password,
        None if batch => {
            return Err(PrismError::Credentials(
                "No guest password provided. Use --guest-password or set NGT_GUEST_PASSWORD"
                    .to_string(),
            ))
        }
        None => prompt_password(&format!("Guest OS password for {}", username))?,
    };
    Ok(GuestCredential { username, password })
}
