//! sizerd — the cluster sizing daemon.
//!
//! Runs the sizing engine behind a REST API, or computes a single plan from
//! a request file:
//!
//! ```text
//! sizerd serve --port 8080
//! sizerd serve --port 8080 --policy control-plane.toml
//! sizerd size --request cluster.json --detailed
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use sizer_api::SizeRequest;
use sizer_core::error::SizingError;
use sizer_core::policy::ControlPlanePolicy;

#[derive(Parser)]
#[command(name = "sizerd", about = "Cluster sizing service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the sizing API over HTTP.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Optional control-plane detection policy (TOML).
        #[arg(long)]
        policy: Option<PathBuf>,
    },

    /// Compute one sizing plan from a JSON request file and print it.
    Size {
        /// Path to a file holding the same body as POST /size/custom.
        #[arg(long)]
        request: PathBuf,

        /// Print the full plan instead of the summary fields.
        #[arg(long)]
        detailed: bool,

        /// Optional control-plane detection policy (TOML).
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, policy } => serve(port, policy).await,
        Command::Size { request, detailed, policy } => run_once(request, detailed, policy),
    }
}

fn load_policy(path: Option<PathBuf>) -> anyhow::Result<ControlPlanePolicy> {
    match path {
        Some(path) => {
            let policy = ControlPlanePolicy::from_file(&path)?;
            info!(path = ?path, markers = policy.markers.len(), "loaded control-plane policy");
            Ok(policy)
        }
        None => Ok(ControlPlanePolicy::default()),
    }
}

async fn serve(port: u16, policy: Option<PathBuf>) -> anyhow::Result<()> {
    let policy = load_policy(policy)?;
    let router = sizer_api::build_router(policy);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "sizing API listening");

    axum::serve(listener, router).await?;
    Ok(())
}

fn run_once(request: PathBuf, detailed: bool, policy: Option<PathBuf>) -> anyhow::Result<()> {
    let policy = load_policy(policy)?;
    let body = std::fs::read_to_string(&request)?;
    let req: SizeRequest = serde_json::from_str(&body)?;

    let platform = req
        .platform
        .ok_or_else(|| SizingError::InvalidInput("platform is required".to_string()))?;
    if req.workloads.is_empty() {
        return Err(SizingError::InvalidInput("workloads must not be empty".to_string()).into());
    }

    let sizing = sizer_engine::size(&req.workloads, platform, req.machine_sets, &policy)?;

    if detailed || req.detailed {
        println!("{}", serde_json::to_string_pretty(&sizing)?);
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "nodeCount": sizing.node_count,
                "zones": sizing.zones,
                "totalCPU": sizing.total_cpu,
                "totalMemory": sizing.total_memory,
                "overCommit": sizing.over_commit,
            }))?
        );
    }
    Ok(())
}
