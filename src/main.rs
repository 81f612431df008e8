//! # poolctl
//!
//! Command-line interface for updating the default node pool of an AKS cluster.
//!
//! ## Usage
//!
//! ```bash
//! # Show what an update would do, without calling Azure
//! poolctl plan --prior current.yaml --desired desired.yaml
//!
//! # Apply an update; the current configuration is read from Azure unless --prior is given
//! poolctl apply \
//!     --cluster-id /subscriptions/<sub>/resourceGroups/<rg>/providers/Microsoft.ContainerService/managedClusters/<name> \
//!     --desired desired.yaml --state cycle-state.json
//!
//! # Show the pool currently serving as the default pool
//! poolctl show --cluster-id <id> --name default --temporary-name temp
//! ```
//!
//! Pool configuration files are YAML (or JSON) documents using the attribute names of
//! the default node pool (`name`, `vm_size`, `temporary_name_for_rotation`, ...).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use node_pool_cycler::controller::{
    plan_update, CyclePhase, DefaultNodePoolState, DefaultNodePoolUpdater, PlannedAction,
    UpdateOutcome,
};
use node_pool_cycler::model::{ClusterId, DefaultNodePool};
use node_pool_cycler::observability::metrics;
use node_pool_cycler::provider::azure::create_agent_pool_client;
use node_pool_cycler::provider::AgentPoolApi;
use node_pool_cycler::runtime::{initialize, InitializationResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Default node pool cycler CLI
#[derive(Parser)]
#[command(name = "poolctl")]
#[command(about = "Update and cycle the default node pool of an AKS cluster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two configurations and show whether the change is in place or needs a cycle
    Plan {
        /// Current default node pool configuration
        #[arg(long)]
        prior: PathBuf,

        /// Desired default node pool configuration
        #[arg(long)]
        desired: PathBuf,
    },
    /// Apply a desired configuration to the default node pool
    Apply {
        /// Resource ID of the managed cluster
        #[arg(long)]
        cluster_id: ClusterId,

        /// Desired default node pool configuration
        #[arg(long)]
        desired: PathBuf,

        /// Current configuration (read from Azure when omitted)
        #[arg(long)]
        prior: Option<PathBuf>,

        /// JSON file holding the cycle state; read if present, always written back
        #[arg(long)]
        state: Option<PathBuf>,

        /// Print Prometheus metrics after the run
        #[arg(long)]
        print_metrics: bool,
    },
    /// Show the pool currently serving as the default node pool
    Show {
        /// Resource ID of the managed cluster
        #[arg(long)]
        cluster_id: ClusterId,

        /// Name of the default node pool
        #[arg(short, long)]
        name: String,

        /// Temporary rotation pool name, to find a pool left by an interrupted cycle
        #[arg(long)]
        temporary_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let init = initialize()?;

    match cli.command {
        Commands::Plan { prior, desired } => plan_command(&prior, &desired),
        Commands::Apply {
            cluster_id,
            desired,
            prior,
            state,
            print_metrics,
        } => {
            apply_command(
                &init,
                cluster_id,
                &desired,
                prior.as_deref(),
                state.as_deref(),
                print_metrics,
            )
            .await
        }
        Commands::Show {
            cluster_id,
            name,
            temporary_name,
        } => show_command(&init, cluster_id, &name, temporary_name.as_deref()).await,
    }
}

/// Print the planned action and the changed attributes
fn plan_command(prior: &Path, desired: &Path) -> Result<()> {
    let prior = read_pool(prior)?;
    let desired = read_pool(desired)?;
    let plan = plan_update(&prior, &desired)?;

    let action = match plan.action {
        PlannedAction::None => "none (no changes)",
        PlannedAction::UpdateInPlace => "update in place",
        PlannedAction::Cycle => "cycle default node pool",
    };
    println!("Default node pool: {}", desired.name);
    println!("Action: {action}");

    if !plan.changes.is_empty() {
        let cycle_fields = plan.changes.cycle_fields();
        println!("\nChanged attributes:");
        for field in plan.changes.fields() {
            let marker = if cycle_fields.contains(&field) {
                " (requires cycle)"
            } else {
                ""
            };
            println!("  {field}{marker}");
        }
    }
    if let (PlannedAction::Cycle, Some(temporary_name)) = (plan.action, desired.temporary_name()) {
        println!("\nTemporary pool: {temporary_name}");
    }

    Ok(())
}

async fn apply_command(
    init: &InitializationResult,
    cluster_id: ClusterId,
    desired: &Path,
    prior: Option<&Path>,
    state_path: Option<&Path>,
    print_metrics: bool,
) -> Result<()> {
    let desired = read_pool(desired)?;
    let mut state = match state_path {
        Some(path) if path.exists() => read_state(path)?,
        _ => DefaultNodePoolState::default(),
    };

    let updater = create_updater(init, cluster_id)?;
    let prior = match prior {
        Some(path) => read_pool(path)?,
        None => updater
            .read(&mut state, &desired.name, desired.temporary_name())
            .await?
            .with_context(|| {
                format!(
                    "Default node pool {} not found in cluster {}",
                    desired.name,
                    updater.cluster()
                )
            })?,
    };

    let result = updater.update(&mut state, &prior, &desired).await;

    // The state is written even on failure so the next run can resume
    if let Some(path) = state_path {
        write_state(path, &state)?;
    }
    if print_metrics {
        print!("{}", metrics::encode_metrics()?);
    }

    let outcome = result?;
    match outcome {
        UpdateOutcome::Unchanged => println!("Default node pool {} is up to date", desired.name),
        UpdateOutcome::UpdatedInPlace => {
            println!("Default node pool {} updated in place", desired.name);
        }
        UpdateOutcome::Cycled(report) => {
            println!("Default node pool {} cycled", report.active_pool_name);
            println!("  Temporary pool created: {}", report.temporary_pool_created);
            println!("  Previous default pool deleted: {}", report.default_pool_deleted);
        }
    }
    Ok(())
}

async fn show_command(
    init: &InitializationResult,
    cluster_id: ClusterId,
    name: &str,
    temporary_name: Option<&str>,
) -> Result<()> {
    let updater = create_updater(init, cluster_id)?;
    let mut state = DefaultNodePoolState::default();

    let Some(pool) = updater.read(&mut state, name, temporary_name).await? else {
        println!("No default node pool found (looked for {name:?} and {temporary_name:?})");
        return Ok(());
    };

    if state.is_temporary_pool_active() {
        println!("# Temporary pool {} is serving as the default node pool", pool.name);
    } else if state.phase == CyclePhase::DefaultPoolCreated {
        println!(
            "# Temporary pool {} from an earlier cycle still exists; the next apply removes it",
            temporary_name.unwrap_or_default()
        );
    }
    print!(
        "{}",
        serde_yaml::to_string(&pool).context("Failed to render node pool configuration")?
    );
    Ok(())
}

fn create_updater(
    init: &InitializationResult,
    cluster_id: ClusterId,
) -> Result<DefaultNodePoolUpdater> {
    info!("Managed cluster: {}", cluster_id);
    let client = create_agent_pool_client(&init.client_config, &init.azure_config)?;
    let api: Arc<dyn AgentPoolApi> = Arc::new(client);
    Ok(DefaultNodePoolUpdater::new(api, cluster_id))
}

fn read_pool(path: &Path) -> Result<DefaultNodePool> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse node pool configuration {}", path.display()))
}

fn read_state(path: &Path) -> Result<DefaultNodePoolState> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse state file {}", path.display()))
}

fn write_state(path: &Path, state: &DefaultNodePoolState) -> Result<()> {
    let contents = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write state file {}", path.display()))?;
    info!(
        "Wrote cycle state to {} (phase: {})",
        path.display(),
        state.phase
    );
    Ok(())
}
