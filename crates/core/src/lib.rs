//! gcs-upload-core - Upload build output to Google Cloud Storage
//!
//! A post-build plugin: once the bundler reports a completed build, the
//! output directory (or the emitted assets) and any static directories are
//! walked, filtered by name patterns, and uploaded concurrently to a bucket.
//! Failures are attached to the build instead of aborting it.

pub mod client;
pub mod compilation;
pub mod compiler;
pub mod config;
pub mod error;
pub mod files;
pub mod filter;
pub mod pipeline;
pub mod plugin;
pub mod storage;
pub mod upload;

/// Prefix of every error this plugin reports
pub const PLUGIN_NAME: &str = "GcsUploadPlugin";

// Re-export commonly used types
pub use client::{GcsClient, GcsConnector};
pub use compilation::{Asset, BuildError, Compilation, PluginError};
pub use compiler::{Compiler, CompilerOptions, DoneHook, OutputOptions, Plugin};
pub use config::{load_config, parse_config, ConfigFile, LoggingConfig};
pub use config::{PluginConfig, PluginOptions, StorageOptions, UploadConfig, UploadOptions};
pub use error::{Error, Result};
pub use files::File;
pub use filter::{FileFilter, IGNORED_FILES};
pub use pipeline::{BatchOutcome, BatchSource, PipelineSet};
pub use plugin::{resolve_directory, GcsUploadPlugin};
pub use storage::{Bucket, Connector, StorageClient, UploadRequest, UploadResult};
pub use upload::Uploader;
