//! Command handlers for gcs-upload CLI

use anyhow::Result;
use gcs_upload_core::{
    load_config, BatchOutcome, Compilation, Compiler, CompilerOptions, GcsUploadPlugin,
    LoggingConfig, OutputOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: Option<&LoggingConfig>) {
    let level = logging.map(|l| l.level.as_str()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed");
    }
}

/// Handle validate command
pub fn handle_validate(config_path: &Path) -> Result<()> {
    println!("Validating {}...", config_path.display());

    let config = load_config(config_path)?;
    let plugin = config.plugin.validate()?;

    println!("  ✅ Valid configuration");
    println!("  Bucket: {}", plugin.upload.bucket_name);
    println!("  Endpoint: {}", plugin.storage.endpoint);
    println!(
        "  Directory: {}",
        plugin
            .directory
            .as_deref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(bundler output)".to_string())
    );
    for dir in &plugin.static_dirs {
        println!("  Static dir: {}", dir.display());
    }
    println!("  Gzip: {}  Public: {}", plugin.upload.gzip, plugin.upload.make_public);

    Ok(())
}

/// Handle run command
pub async fn handle_run(
    config_path: &Path,
    output_path: Option<PathBuf>,
    output_context: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    init_logging(config.logging.as_ref());

    let plugin = Arc::new(GcsUploadPlugin::new(config.plugin)?);

    let mut compiler = Compiler::new(CompilerOptions {
        output: OutputOptions {
            path: output_path,
            context: output_context,
        },
    });
    compiler.apply(plugin.clone())?;

    println!(
        "Uploading to bucket '{}'...",
        plugin.config().upload.bucket_name
    );

    let compilation = Arc::new(Compilation::new());
    let mut outcomes = Vec::new();
    for set in compiler.emit_done(Arc::clone(&compilation)) {
        outcomes.extend(set.join().await);
    }

    for outcome in &outcomes {
        match outcome {
            BatchOutcome::Done { source, uploaded } => {
                println!("  ✅ {}: {} file(s) uploaded", source, uploaded)
            }
            BatchOutcome::Errored { source } => println!("  ❌ {}: failed", source),
            BatchOutcome::Cancelled { source } => println!("  ⚠️  {}: cancelled", source),
        }
    }

    let errors = compilation.error_messages();
    if !errors.is_empty() {
        println!();
        println!("Build errors:");
        for error in &errors {
            println!("  {}", error);
        }
        return Err(anyhow::anyhow!("{} upload batch(es) failed", errors.len()));
    }

    Ok(())
}
