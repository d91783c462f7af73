use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "terraform-provider-vsphere")]
#[command(about = "Configure vSphere hosts, datastores and appliance settings", long_about = None)]
pub struct Cli {
    /// Provider connection config (JSON). VSPHERE_* variables override it.
    #[arg(short, long, global = true, env = "VSPHERE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `tpv_provider=debug`
    #[arg(long, global = true, env = "TF_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update a resource from a configuration file
    Apply {
        #[command(flatten)]
        target: ResourceTarget,
        /// Resource configuration (JSON object)
        #[arg(long)]
        input: PathBuf,
    },
    /// Re-read a resource and rewrite its state
    Refresh {
        #[command(flatten)]
        target: ResourceTarget,
    },
    /// Delete a resource and remove its state
    Destroy {
        #[command(flatten)]
        target: ResourceTarget,
    },
    /// Adopt an existing object into a state file
    Import {
        #[command(flatten)]
        target: ResourceTarget,
        /// Import ID, format depends on the resource type
        #[arg(long)]
        id: String,
    },
    /// Read a data source
    Read {
        /// Data source type, e.g. vsphere_host_config_date_time
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Data source arguments (JSON object)
        #[arg(long)]
        input: PathBuf,
    },
    /// List the resource and data source types served
    Types,
    /// Host utilities
    #[command(subcommand)]
    Host(HostCommands),
}

#[derive(Args, Debug)]
pub struct ResourceTarget {
    /// Resource type, e.g. vsphere_nas_datastore
    #[arg(short = 't', long = "type")]
    pub type_name: String,
    /// State file holding this resource
    #[arg(short, long)]
    pub state: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum HostCommands {
    /// Resolve a managed-object ID or hostname to a host
    Resolve {
        /// Host ID or hostname
        host: String,
    },
    /// Maintenance mode
    #[command(subcommand)]
    Maintenance(MaintenanceCommands),
}

#[derive(Subcommand, Debug)]
pub enum MaintenanceCommands {
    /// Enter maintenance mode
    Enter {
        /// Host ID or hostname
        host: String,
        /// Task timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
        /// Evacuate powered-off VMs (vCenter only)
        #[arg(long)]
        evacuate: bool,
    },
    /// Exit maintenance mode
    Exit {
        /// Host ID or hostname
        host: String,
        /// Task timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_maintenance() {
        let cli = Cli::parse_from([
            "terraform-provider-vsphere",
            "host",
            "maintenance",
            "enter",
            "esxi-01.lab",
            "--evacuate",
        ]);
        match cli.command {
            Commands::Host(HostCommands::Maintenance(MaintenanceCommands::Enter { host, timeout, evacuate })) => {
                assert_eq!(host, "esxi-01.lab");
                assert_eq!(timeout, 300);
                assert!(evacuate);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_apply_target() {
        let cli = Cli::parse_from([
            "terraform-provider-vsphere",
            "apply",
            "-t",
            "vsphere_vcenter_dns",
            "--state",
            "dns.tfstate.json",
            "--input",
            "dns.json",
        ]);
        let Commands::Apply { target, input } = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(target.type_name, "vsphere_vcenter_dns");
        assert_eq!(target.state, PathBuf::from("dns.tfstate.json"));
        assert_eq!(input, PathBuf::from("dns.json"));
    }
}
