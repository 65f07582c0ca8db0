use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gradient",
    about = "gradient — progressive delivery for serverless services",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy an application to a target, stage by stage.
    ///
    /// The strategy comes from the application config: an explicit
    /// [[pipeline.stages]] list selects pipeline sync; otherwise a
    /// single quick-sync stage deploys and routes 100% traffic now.
    Deploy {
        /// Application directory (contains gradient.toml and the manifest)
        #[arg(short, long, default_value = ".")]
        path: String,
        /// Deploy-target config file
        #[arg(short, long)]
        target: String,
        /// Execute the ROLLBACK stage when a stage fails
        #[arg(long)]
        rollback_on_failure: bool,
    },
    /// Show what a deploy would change, without executing anything
    Preview {
        /// Application directory (contains gradient.toml and the manifest)
        #[arg(short, long, default_value = ".")]
        path: String,
        /// Deploy-target config file
        #[arg(short, long)]
        target: String,
    },
    /// List the stages this engine can execute
    Stages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gradient=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            path,
            target,
            rollback_on_failure,
        } => commands::deploy::run(&path, &target, rollback_on_failure).await,
        Commands::Preview { path, target } => commands::preview::run(&path, &target).await,
        Commands::Stages => {
            for stage in gradient_pipeline::defined_stages() {
                println!("{stage}\t{}", gradient_pipeline::stage_description(stage));
            }
            Ok(())
        }
    }
}
