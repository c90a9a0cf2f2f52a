use anyhow::Result;
use clap::Parser;
use color_eyre::config::HookBuilder;
use std::path::PathBuf;

mod handlers;

/// gcs-upload - upload build output to Google Cloud Storage
#[derive(Parser, Debug)]
#[command(name = "gcs-upload")]
#[command(version)]
#[command(about = "Upload build output to a Google Cloud Storage bucket", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fire the build-complete hook once and upload the output
    Run {
        /// Plugin config file (TOML)
        #[arg(short, long, default_value = "gcs-upload.toml")]
        config: PathBuf,
        /// Bundler output path, used when the config sets no directory
        #[arg(long)]
        output_path: Option<PathBuf>,
        /// Bundler context, used when neither directory nor output path is set
        #[arg(long)]
        output_context: Option<PathBuf>,
    },

    /// Validate a config file without touching the network
    Validate {
        /// Plugin config file (TOML)
        #[arg(short, long, default_value = "gcs-upload.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Run {
            config,
            output_path,
            output_context,
        } => handlers::handle_run(&config, output_path, output_context).await,
        Commands::Validate { config } => handlers::handle_validate(&config),
    }
}
