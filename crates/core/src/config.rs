//! Plugin options, their validation, and the TOML config file

use crate::error::{Error, Result};
use crate::files::File;
use crate::filter::FileFilter;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Computes the destination key of a file
pub type DestinationNameFn = Arc<dyn Fn(&File) -> String + Send + Sync>;

/// Computes the user metadata sent with a file
pub type MetadataFn = Arc<dyn Fn(&File) -> HashMap<String, String> + Send + Sync>;

/// Default destination: the file's own path, unchanged.
pub fn default_destination_name(file: &File) -> String {
    file.path.to_string_lossy().into_owned()
}

/// Default metadata: none.
pub fn default_metadata(_file: &File) -> HashMap<String, String> {
    HashMap::new()
}

/// Connection settings for the storage service
#[derive(Debug, Clone, Deserialize)]
pub struct StorageOptions {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl StorageOptions {
    /// Options for the public GCS endpoint with HMAC interoperability keys.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            project_id: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Upload settings as supplied by the user
#[derive(Clone, Default, Deserialize)]
pub struct UploadOptions {
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub force_create_bucket: Option<bool>,
    #[serde(default)]
    pub gzip: Option<bool>,
    #[serde(default, alias = "public")]
    pub make_public: Option<bool>,
    /// Prepended to the default destination (config file only)
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Static metadata used by the default metadata function (config file only)
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(skip)]
    pub destination_name_fn: Option<DestinationNameFn>,
    #[serde(skip)]
    pub metadata_fn: Option<MetadataFn>,
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("bucket_name", &self.bucket_name)
            .field("force_create_bucket", &self.force_create_bucket)
            .field("gzip", &self.gzip)
            .field("make_public", &self.make_public)
            .field("key_prefix", &self.key_prefix)
            .field("metadata", &self.metadata)
            .field("destination_name_fn", &self.destination_name_fn.is_some())
            .field("metadata_fn", &self.metadata_fn.is_some())
            .finish()
    }
}

/// Raw plugin options. Build them in code or deserialize them, then call
/// [`PluginOptions::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginOptions {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub static_dirs: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub storage_options: Option<StorageOptions>,
    #[serde(default)]
    pub upload_options: Option<UploadOptions>,
}

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dirs.get_or_insert_with(Vec::new).push(dir.into());
        self
    }

    pub fn include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn storage_options(mut self, options: StorageOptions) -> Self {
        self.storage_options = Some(options);
        self
    }

    pub fn bucket_name(mut self, name: impl Into<String>) -> Self {
        self.upload().bucket_name = Some(name.into());
        self
    }

    pub fn force_create_bucket(mut self, force: bool) -> Self {
        self.upload().force_create_bucket = Some(force);
        self
    }

    pub fn gzip(mut self, gzip: bool) -> Self {
        self.upload().gzip = Some(gzip);
        self
    }

    pub fn make_public(mut self, public: bool) -> Self {
        self.upload().make_public = Some(public);
        self
    }

    pub fn destination_name_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&File) -> String + Send + Sync + 'static,
    {
        self.upload().destination_name_fn = Some(Arc::new(f));
        self
    }

    pub fn metadata_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&File) -> HashMap<String, String> + Send + Sync + 'static,
    {
        self.upload().metadata_fn = Some(Arc::new(f));
        self
    }

    fn upload(&mut self) -> &mut UploadOptions {
        self.upload_options.get_or_insert_with(UploadOptions::default)
    }

    /// Check the options and fill in defaults. No I/O happens here.
    pub fn validate(self) -> Result<PluginConfig> {
        let storage = self
            .storage_options
            .ok_or_else(|| Error::config("missing required option 'storage_options'"))?;
        if storage.endpoint.trim().is_empty() {
            return Err(Error::config("'storage_options.endpoint' cannot be empty"));
        }
        if storage.access_key_id.is_empty() {
            return Err(Error::config(
                "missing required option 'storage_options.access_key_id'",
            ));
        }
        if storage.secret_access_key.is_empty() {
            return Err(Error::config(
                "missing required option 'storage_options.secret_access_key'",
            ));
        }

        let upload = self
            .upload_options
            .ok_or_else(|| Error::config("missing required option 'upload_options'"))?;
        let bucket_name = match upload.bucket_name {
            Some(name) if !name.trim().is_empty() => name,
            Some(_) => return Err(Error::config("'upload_options.bucket_name' cannot be empty")),
            None => {
                return Err(Error::config(
                    "missing required option 'upload_options.bucket_name'",
                ))
            }
        };

        let destination_name_fn = match (upload.destination_name_fn, upload.key_prefix) {
            (Some(f), _) => f,
            (None, Some(prefix)) => Arc::new(move |file: &File| {
                format!("{}{}", prefix, default_destination_name(file))
            }) as DestinationNameFn,
            (None, None) => Arc::new(default_destination_name) as DestinationNameFn,
        };
        let metadata_fn = match (upload.metadata_fn, upload.metadata) {
            (Some(f), _) => f,
            (None, Some(metadata)) => Arc::new(move |_: &File| metadata.clone()) as MetadataFn,
            (None, None) => Arc::new(default_metadata) as MetadataFn,
        };

        let include = self.include.unwrap_or_default();
        let exclude = self.exclude.unwrap_or_default();
        let filter = FileFilter::with_default_ignores(include.as_slice(), exclude.as_slice())?;

        Ok(PluginConfig {
            directory: self.directory,
            static_dirs: self.static_dirs.unwrap_or_default(),
            include,
            exclude,
            filter,
            storage,
            upload: Arc::new(UploadConfig {
                bucket_name,
                force_create_bucket: upload.force_create_bucket.unwrap_or(false),
                gzip: upload.gzip.unwrap_or(false),
                make_public: upload.make_public.unwrap_or(false),
                destination_name_fn,
                metadata_fn,
            }),
        })
    }
}

/// Validated upload settings
#[derive(Clone)]
pub struct UploadConfig {
    pub bucket_name: String,
    pub force_create_bucket: bool,
    pub gzip: bool,
    pub make_public: bool,
    pub destination_name_fn: DestinationNameFn,
    pub metadata_fn: MetadataFn,
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("bucket_name", &self.bucket_name)
            .field("force_create_bucket", &self.force_create_bucket)
            .field("gzip", &self.gzip)
            .field("make_public", &self.make_public)
            .finish_non_exhaustive()
    }
}

/// Validated plugin configuration
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub directory: Option<PathBuf>,
    pub static_dirs: Vec<PathBuf>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub filter: FileFilter,
    pub storage: StorageOptions,
    pub upload: Arc<UploadConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Config file layout: plugin options at the top level plus a `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub plugin: PluginOptions,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

// Default values
fn default_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load a config file without validating the plugin options.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    parse_config(&content)
}

/// Parse config file content.
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    toml::from_str(content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })
}
