//! VM command handlers

use crate::cli::{Cli, Command, GetResource, VmsAction};
use crate::output::{output_vm_probes, output_vms};
use crate::prism::{Fetcher, PrismClient};
use crate::ui::{create_spinner, finish_spinner};

use super::api::power_state_filter;
use super::models::ProbeStatus;

/// Run 'get vms'
pub async fn run_vms_command(
    client: &PrismClient,
    fetcher: &Fetcher,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let Command::Get {
        resource: GetResource::Vms(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let mut query = args.query.to_query_spec()?;
    if let Some(power) = args.power {
        query = query.and_filter(power_state_filter(power.as_api_str()));
    }
    let spinner = create_spinner("Fetching VMs...", cli.batch);
    let vms = client.list_vms(fetcher, &query).await?;
    finish_spinner(spinner);

    if vms.is_empty() {
        eprintln!("No VMs found");
        return Ok(());
    }
    output_vms(&vms, args.output, cli.no_header);
    Ok(())
}

/// Run 'vms probe'
pub async fn run_vms_probe_command(
    client: &PrismClient,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let Command::Vms {
        action: VmsAction::Probe(args),
    } = &cli.command
    else {
        unreachable!()
    };

    let spinner = create_spinner(&format!("Probing VM APIs on {}...", client.host()), cli.batch);
    let probes = client.probe_vm_versions().await?;
    finish_spinner(spinner);

    output_vm_probes(&probes, args.output, cli.no_header);
    if !probes.iter().any(|p| p.status == ProbeStatus::Available) {
        return Err("No VM API version is available on this Prism Central".into());
    }
    Ok(())
}
