use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fanout_hub::api::ApiServer;
use fanout_hub::{Config, Hub};

/// Hub - fan a query out to downstream nodes and aggregate the answers
#[derive(Parser)]
#[command(name = "hub", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "HUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Node source CSV (overrides HUB_NODES_FILE and the config file)
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the parsed node table
    Nodes,
    /// Run one query from the command line and print the aggregate
    Query {
        /// Query input sent to every node
        input: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,fanout_hub=info",
        1 => "info,fanout_hub=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(nodes) = cli.nodes {
        config.nodes_path = nodes;
    }
    tracing::debug!(?config, "loaded configuration");

    let hub = Hub::new(config)?;

    match cli.command {
        Some(Command::Nodes) => cmd_nodes(&hub).await,
        Some(Command::Query { input }) => cmd_query(&hub, &input).await,
        None => serve(hub).await,
    }
}

async fn serve(hub: Hub) -> anyhow::Result<()> {
    // Refuse to serve query traffic without a usable node source
    let nodes = hub.nodes().await?;

    tracing::info!(
        hub = %hub.config().hub,
        port = hub.config().port,
        nodes = nodes.len(),
        enabled = nodes.iter().filter(|n| n.enabled).count(),
        shape = ?hub.config().shape,
        "starting fan-out hub"
    );

    ApiServer::new(hub).run().await?;
    Ok(())
}

async fn cmd_nodes(hub: &Hub) -> anyhow::Result<()> {
    let nodes = hub.nodes().await?;

    println!("{:<8} {:>8}  {:<12} URL", "ENABLED", "TIMEOUT", "TYPE");
    for node in &nodes {
        println!(
            "{:<8} {:>7}s  {:<12} {}",
            if node.enabled { "yes" } else { "no" },
            node.timeout.as_secs(),
            node.node_type.as_deref().unwrap_or("-"),
            node.url
        );
    }
    Ok(())
}

async fn cmd_query(hub: &Hub, input: &str) -> anyhow::Result<()> {
    let response = hub.query(input).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
