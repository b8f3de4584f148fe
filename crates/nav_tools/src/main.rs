//! Grid Nav - Development Tools

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nav_tools::scenario::Scenario;

#[derive(Parser)]
#[command(name = "nav-tools")]
#[command(about = "Development tools for the Grid Nav planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file
    Validate {
        /// Path to the RON scenario file
        path: String,
    },
    /// Plan a scenario and print the wire commands
    Plan {
        /// Path to the RON scenario file
        path: String,
        /// Optional output path for the plan artefact
        #[arg(long)]
        out: Option<String>,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating scenario: {path}");
            match Scenario::load(&path).and_then(|s| s.validate()) {
                Ok(()) => tracing::info!("Validation passed"),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Plan { path, out } => {
            let plan = match Scenario::load(&path).and_then(|s| s.plan()) {
                Ok(plan) => plan,
                Err(e) => {
                    tracing::error!("Planning failed: {e}");
                    std::process::exit(1);
                }
            };

            for message in plan.wire_messages() {
                println!("{message}");
            }
            tracing::info!(
                visited = plan.visited.len(),
                duration_secs = plan.estimated_duration_secs(),
                "Plan complete"
            );

            if let Some(out) = out {
                if let Err(e) = plan.save(&out) {
                    tracing::error!("Failed to save plan artefact: {e}");
                    std::process::exit(1);
                }
                tracing::info!("Plan artefact written to {out}");
            }
        }
    }
}
