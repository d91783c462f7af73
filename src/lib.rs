//! Command-line driver for the vSphere provider.
//!
//! Loads the connection config, logs in, and runs one lifecycle operation
//! against JSON configuration and state files. Results are printed to
//! stdout as JSON.

pub mod cli;
pub mod state;

use cli::{Cli, Commands, HostCommands, MaintenanceCommands};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tpv_provider::Provider;
use tpv_vsphere::{hostsystem, VsphereApi, VsphereClient, VsphereConfig};

/// Install the global subscriber. `log` records from the library crates
/// are bridged into it. Returns false when a subscriber was already set.
pub fn init_logging(filter: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Logging not initialised: {e}");
            false
        }
    }
}

/// Build the connection config from an optional file plus `VSPHERE_*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<VsphereConfig, String> {
    let base = match path {
        Some(p) => VsphereConfig::from_file(p)?,
        None => VsphereConfig::default(),
    };
    let config = base.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn connect(config: &VsphereConfig) -> Result<VsphereClient, String> {
    let mut client = VsphereClient::new(config)?;
    client.login().await?;
    let safe = config.safe();
    tracing::info!(host = %safe.host, user = %safe.username, "connected to vSphere");
    Ok(client)
}

/// End the session once no command holds the client any more.
async fn disconnect(client: Arc<VsphereClient>) -> bool {
    match Arc::try_unwrap(client) {
        Ok(mut client) => {
            if let Err(e) = client.logout().await {
                tracing::warn!(error = %e, "logout failed");
            }
            true
        }
        Err(_) => {
            tracing::warn!("client still shared, leaving the session open");
            false
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let output = match cli.command {
        Commands::Types => types_listing(),
        command => {
            let config = load_config(cli.config.as_deref())?;
            let client = Arc::new(connect(&config).await?);
            let result = execute(client.clone(), command).await;
            disconnect(client).await;
            result?
        }
    };
    let rendered = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn types_listing() -> Value {
    json!({
        "resources": tpv_provider::resources::all().iter().map(|r| r.type_name()).collect::<Vec<_>>(),
        "data_sources": tpv_provider::data_sources::all().iter().map(|d| d.type_name()).collect::<Vec<_>>(),
    })
}

/// Run one command against an already connected endpoint.
pub async fn execute(api: Arc<dyn VsphereApi>, command: Commands) -> Result<Value, String> {
    let provider = Provider::new(api);

    match command {
        Commands::Apply { target, input } => {
            let config = state::read_json(&input)?;
            let prior = state::load(&target.state)?;
            if let Some(file) = &prior {
                state::check_type(file, &target.type_name)?;
            }
            let next = provider
                .apply(&target.type_name, prior.as_ref().map(|f| &f.state), &config)
                .await?;
            let file = state::StateFile::new(target.type_name, next);
            state::save(&target.state, &file)?;
            Ok(serde_json::to_value(file).map_err(|e| e.to_string())?)
        }
        Commands::Refresh { target } => {
            let file = state::load_existing(&target.state, &target.type_name)?;
            match provider.refresh(&target.type_name, &file.state).await? {
                Some(next) => {
                    let file = state::StateFile::new(target.type_name, next);
                    state::save(&target.state, &file)?;
                    Ok(serde_json::to_value(file).map_err(|e| e.to_string())?)
                }
                None => {
                    state::remove(&target.state)?;
                    Ok(json!({"type": target.type_name, "id": file.state.id, "removed": true}))
                }
            }
        }
        Commands::Destroy { target } => {
            let file = state::load_existing(&target.state, &target.type_name)?;
            provider.destroy(&target.type_name, &file.state).await?;
            state::remove(&target.state)?;
            Ok(json!({"type": target.type_name, "id": file.state.id, "destroyed": true}))
        }
        Commands::Import { target, id } => {
            if let Some(existing) = state::load(&target.state)? {
                return Err(format!(
                    "state '{}' already holds {} {}",
                    target.state.display(),
                    existing.resource_type,
                    existing.state.id
                ));
            }
            let imported = provider.import(&target.type_name, &id).await?;
            let file = state::StateFile::new(target.type_name, imported);
            state::save(&target.state, &file)?;
            Ok(serde_json::to_value(file).map_err(|e| e.to_string())?)
        }
        Commands::Read { type_name, input } => {
            let config = state::read_json(&input)?;
            let result = provider.read_data_source(&type_name, &config).await?;
            Ok(serde_json::to_value(state::StateFile::new(type_name, result)).map_err(|e| e.to_string())?)
        }
        Commands::Types => Ok(types_listing()),
        Commands::Host(HostCommands::Resolve { host }) => {
            let (summary, ident) = hostsystem::check_if_hostname_or_id(provider.api(), &host).await?;
            Ok(json!({
                "host": summary.host,
                "name": summary.name,
                "connection_state": summary.connection_state,
                "matched": ident.attribute,
            }))
        }
        Commands::Host(HostCommands::Maintenance(cmd)) => maintenance(provider.api(), cmd).await,
    }
}

async fn maintenance(api: &dyn VsphereApi, cmd: MaintenanceCommands) -> Result<Value, String> {
    match cmd {
        MaintenanceCommands::Enter { host, timeout, evacuate } => {
            let (summary, _) = hostsystem::check_if_hostname_or_id(api, &host).await?;
            hostsystem::enter_maintenance_mode(api, &summary, Duration::from_secs(timeout), evacuate).await?;
            Ok(json!({"host": summary.host, "in_maintenance": true}))
        }
        MaintenanceCommands::Exit { host, timeout } => {
            let (summary, _) = hostsystem::check_if_hostname_or_id(api, &host).await?;
            hostsystem::exit_maintenance_mode(api, &summary, Duration::from_secs(timeout)).await?;
            Ok(json!({"host": summary.host, "in_maintenance": false}))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> VsphereClient {
        let config = VsphereConfig {
            host: "vcenter.lab.local".into(),
            username: "administrator@vsphere.local".into(),
            password: "pw".into(),
            ..Default::default()
        };
        VsphereClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn disconnect_logs_out_sole_owner() {
        assert!(disconnect(Arc::new(client())).await);
    }

    #[tokio::test]
    async fn disconnect_skips_shared_client() {
        let client = Arc::new(client());
        let held = client.clone();
        assert!(!disconnect(client).await);
        assert!(disconnect(held).await);
    }

    #[test]
    fn second_logging_init_is_reported() {
        init_logging("debug");
        assert!(!init_logging("debug"));
    }
}
