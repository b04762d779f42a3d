//! Compute CLI - Dimension Data server management for CTO Platform.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cto_compute::providers::dimensiondata::{
    CreateNodeRequest, DimensionData, NetworkAttachment, DEFAULT_REGION,
};
use cto_compute::providers::{NodeAuthPassword, NodeDriver};

/// Compute CLI - Dimension Data server management.
#[derive(Parser)]
#[command(name = "compute")]
#[command(about = "Deploy and manage Dimension Data cloud servers")]
struct Cli {
    /// Account user id (or set `DIMENSIONDATA_USER_ID` env var).
    #[arg(long, env = "DIMENSIONDATA_USER_ID")]
    user_id: String,

    /// Account password (or set `DIMENSIONDATA_PASSWORD` env var).
    #[arg(long, env = "DIMENSIONDATA_PASSWORD", hide_env_values = true)]
    password: String,

    /// Region key (e.g., dd-na, dd-eu, dd-au).
    #[arg(long, env = "DIMENSIONDATA_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all servers.
    ListNodes,

    /// Get details of a specific server.
    GetNode {
        /// Server ID.
        #[arg(long)]
        id: String,
    },

    /// List base images.
    ListImages {
        /// Only images in this datacenter.
        #[arg(long)]
        location: Option<String>,
    },

    /// List node sizes.
    ListSizes,

    /// List datacenters.
    ListLocations,

    /// Get a datacenter by ID.
    GetLocation {
        /// Datacenter ID (e.g., NA9).
        #[arg(long)]
        id: String,
    },

    /// List legacy networks.
    ListNetworks {
        /// Only networks in this datacenter.
        #[arg(long)]
        location: Option<String>,
    },

    /// List network domains.
    ListNetworkDomains {
        /// Only domains in this datacenter.
        #[arg(long)]
        location: Option<String>,
    },

    /// List VLANs.
    ListVlans {
        /// Only VLANs in this datacenter.
        #[arg(long)]
        location: Option<String>,

        /// Only VLANs in this network domain.
        #[arg(long)]
        network_domain: Option<String>,
    },

    /// Deploy a new server.
    Create {
        /// Server name.
        #[arg(long)]
        name: String,

        /// Base image ID.
        #[arg(long)]
        image: String,

        /// Server description.
        #[arg(long, default_value = "")]
        description: String,

        /// Legacy network ID.
        #[arg(long, conflicts_with_all = ["network_domain", "vlan"])]
        network: Option<String>,

        /// Network domain ID (requires --vlan).
        #[arg(long, requires = "vlan")]
        network_domain: Option<String>,

        /// VLAN ID inside the network domain.
        #[arg(long, requires = "network_domain")]
        vlan: Option<String>,

        /// Administrator password; generated when omitted.
        #[arg(long, env = "DIMENSIONDATA_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,

        /// Leave the server stopped after deploy.
        #[arg(long, default_value = "false")]
        no_start: bool,
    },

    /// Delete a server.
    Destroy {
        /// Server ID.
        #[arg(long)]
        id: String,
    },

    /// Reboot a server.
    Reboot {
        /// Server ID.
        #[arg(long)]
        id: String,
    },

    /// Power on a server.
    Start {
        /// Server ID.
        #[arg(long)]
        id: String,
    },

    /// Shut a server down through its guest OS.
    Shutdown {
        /// Server ID.
        #[arg(long)]
        id: String,
    },

    /// Abruptly power off a server.
    PowerOff {
        /// Server ID.
        #[arg(long)]
        id: String,
    },

    /// Abruptly reset a server.
    Reset {
        /// Server ID.
        #[arg(long)]
        id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn print_accepted(action: &str, id: &str, accepted: bool) {
    if accepted {
        println!("{action} of {id} accepted (in progress)");
    } else {
        println!("{action} of {id} was not accepted");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let driver = DimensionData::new(&cli.user_id, &cli.password, &cli.region)
        .context("Failed to create Dimension Data driver")?;

    match cli.command {
        Commands::ListNodes => print_json(&driver.list_nodes().await?)?,
        Commands::GetNode { id } => print_json(&driver.get_node(&id).await?)?,
        Commands::ListImages { location } => {
            print_json(&driver.list_images(location.as_deref()).await?)?;
        }
        Commands::ListSizes => print_json(&driver.list_sizes().await?)?,
        Commands::ListLocations => print_json(&driver.list_locations().await?)?,
        Commands::GetLocation { id } => print_json(&driver.get_location_by_id(&id).await?)?,
        Commands::ListNetworks { location } => {
            print_json(&driver.list_networks(location.as_deref()).await?)?;
        }
        Commands::ListNetworkDomains { location } => {
            print_json(&driver.list_network_domains(location.as_deref()).await?)?;
        }
        Commands::ListVlans {
            location,
            network_domain,
        } => {
            print_json(
                &driver
                    .list_vlans(location.as_deref(), network_domain.as_deref())
                    .await?,
            )?;
        }
        Commands::Create {
            name,
            image,
            description,
            network,
            network_domain,
            vlan,
            admin_password,
            no_start,
        } => {
            let attachment = match (network, network_domain, vlan) {
                (Some(network_id), None, None) => NetworkAttachment::Network { network_id },
                (None, Some(network_domain_id), Some(vlan_id)) => {
                    NetworkAttachment::NetworkDomain {
                        network_domain_id,
                        vlan_id,
                    }
                }
                _ => anyhow::bail!("Specify either --network or --network-domain with --vlan"),
            };

            let node = driver
                .create_node(CreateNodeRequest {
                    name,
                    image_id: image,
                    auth: admin_password.map(NodeAuthPassword::new),
                    description,
                    attachment,
                    start: !no_start,
                })
                .await
                .context("Failed to deploy server")?;

            info!(node_id = %node.id, "Server deploy submitted");
            print_json(&node)?;
        }
        Commands::Destroy { id } => {
            print_accepted("Delete", &id, driver.destroy_node(&id).await?);
        }
        Commands::Reboot { id } => {
            print_accepted("Reboot", &id, driver.reboot_node(&id).await?);
        }
        Commands::Start { id } => {
            print_accepted("Start", &id, driver.start_node(&id).await?);
        }
        Commands::Shutdown { id } => {
            print_accepted("Shutdown", &id, driver.shutdown_graceful(&id).await?);
        }
        Commands::PowerOff { id } => {
            print_accepted("Power off", &id, driver.power_off(&id).await?);
        }
        Commands::Reset { id } => {
            print_accepted("Reset", &id, driver.reset_node(&id).await?);
        }
    }

    Ok(())
}
