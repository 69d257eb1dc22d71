//! prismctl - Main entry point

use std::time::Duration;

use clap::Parser;
use log::{debug, info};

use prismctl::cli::{CategoryAction, NgtAction, RoleAction, VmsAction};
use prismctl::{
    run_categories_command, run_category_assign_command, run_move_command, run_ngt_command,
    run_operations_command, run_policies_command, run_role_action_command, run_role_command,
    run_roles_command, run_subnet_vms_command, run_subnets_command, run_user_policies_command,
    run_users_command, run_vms_command, run_vms_probe_command, Cli, CliCredentials, Command,
    ConnectionSettings, CredentialResolver, CredentialSource, Fetcher, GetResource, MoveClient,
    PrismClient,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --log-level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    info!("Starting prismctl v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Options: insecure={}, timeout={}s, batch={}",
        cli.insecure, cli.timeout, cli.batch
    );

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ConnectionSettings {
        verify_tls: !cli.insecure,
        timeout: Duration::from_secs(cli.timeout),
    };
    let resolver = CredentialResolver::new(cli.batch);
    let fetcher = Fetcher::default();

    if let Command::Move { connection, .. } = &cli.command {
        let credentials = resolver.resolve(
            CredentialSource::MOVE,
            &CliCredentials {
                host: connection.move_host.as_deref(),
                username: connection.move_username.as_deref(),
                password: connection.move_password.as_deref(),
            },
        )?;
        debug!("Connecting to Move at {}", credentials.host);
        let client = MoveClient::login(&credentials, &settings).await?;
        return run_move_command(&client, &fetcher, cli).await;
    }

    let credentials = resolver.resolve(
        CredentialSource::PRISM_CENTRAL,
        &CliCredentials {
            host: cli.host.as_deref(),
            username: cli.username.as_deref(),
            password: cli.password.as_deref(),
        },
    )?;
    let client = PrismClient::new(&credentials, &settings)?;
    debug!("Connecting to Prism Central at {}", client.host());

    match &cli.command {
        Command::Get { resource } => match resource {
            GetResource::Roles(_) => run_roles_command(&client, &fetcher, cli).await,
            GetResource::Role(_) => run_role_command(&client, &fetcher, cli).await,
            GetResource::Users(_) => run_users_command(&client, &fetcher, cli).await,
            GetResource::UserPolicies(_) => {
                run_user_policies_command(&client, &fetcher, cli).await
            }
            GetResource::Policies(_) => run_policies_command(&client, &fetcher, cli).await,
            GetResource::Operations(_) => run_operations_command(&client, &fetcher, cli).await,
            GetResource::Vms(_) => run_vms_command(&client, &fetcher, cli).await,
            GetResource::Subnets(_) => run_subnets_command(&client, &fetcher, cli).await,
            GetResource::Categories(_) => run_categories_command(&client, &fetcher, cli).await,
            GetResource::SubnetVms(_) => run_subnet_vms_command(&client, &fetcher, cli).await,
        },
        Command::Role {
            action: RoleAction::Create(_) | RoleAction::AddViewOnly(_),
        } => run_role_action_command(&client, &fetcher, cli).await,
        Command::Vms {
            action: VmsAction::Probe(_),
        } => run_vms_probe_command(&client, cli).await,
        Command::Category {
            action: CategoryAction::Assign(_),
        } => run_category_assign_command(&client, &fetcher, cli).await,
        Command::Ngt {
            action: NgtAction::Status(_) | NgtAction::Install(_),
        } => run_ngt_command(&client, &fetcher, cli).await,
        Command::Move { .. } => unreachable!(),
    }
}
