//! The upload plugin: lifecycle wiring and per-source pipelines

use crate::client::GcsConnector;
use crate::compilation::Compilation;
use crate::compiler::{Compiler, OutputOptions, Plugin};
use crate::config::{PluginConfig, PluginOptions};
use crate::error::Result;
use crate::files::{self, File, WalkExcludes};
use crate::pipeline::{BatchOutcome, BatchSource, BatchState, Pipeline, PipelineSet};
use crate::storage::{Bucket, Connector, LazyClient, StorageClient, UploadResult};
use crate::upload::Uploader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, info, info_span, Instrument};

/// Pick the primary directory: configured, then output path, then output
/// context, then the current directory.
pub fn resolve_directory(configured: Option<&Path>, output: &OutputOptions) -> PathBuf {
    configured
        .or(output.path.as_deref())
        .or(output.context.as_deref())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Uploads build output to a bucket once a build completes
pub struct GcsUploadPlugin {
    config: PluginConfig,
    connector: Arc<dyn Connector>,
    client: LazyClient,
    directory: OnceLock<PathBuf>,
    bucket_ready: OnceCell<()>,
}

impl GcsUploadPlugin {
    /// Validate `options` and build a plugin that talks to GCS.
    pub fn new(options: PluginOptions) -> Result<Self> {
        Ok(Self::with_connector(options.validate()?, Arc::new(GcsConnector)))
    }

    pub fn with_connector(config: PluginConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            client: LazyClient::new(),
            directory: OnceLock::new(),
            bucket_ready: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Connect to storage. Later calls reuse the first client.
    pub fn connect(&self) -> Result<Arc<dyn StorageClient>> {
        self.client.get_or_connect(&*self.connector, &self.config.storage)
    }

    /// The primary directory, if one was configured or resolved by `apply`.
    pub fn directory(&self) -> Option<&Path> {
        self.directory
            .get()
            .map(PathBuf::as_path)
            .or(self.config.directory.as_deref())
    }

    pub fn filter_files(&self, files: Vec<File>) -> Vec<File> {
        self.config.filter.apply(files)
    }

    /// Upload files as they are, without filtering.
    pub async fn upload_files(&self, files: Vec<File>) -> Result<Vec<UploadResult>> {
        let bucket = Bucket::new(self.connect()?, self.config.upload.bucket_name.clone());
        if self.config.upload.force_create_bucket {
            self.bucket_ready
                .get_or_try_init(|| bucket.ensure_exists())
                .await?;
        }
        Uploader::new(bucket, Arc::clone(&self.config.upload))
            .upload_files(files)
            .await
    }

    /// Filter then upload.
    pub async fn handle_files(&self, files: Vec<File>) -> Result<Vec<UploadResult>> {
        let files = self.filter_files(files);
        debug!(state = ?BatchState::Uploading, count = files.len());
        self.upload_files(files).await
    }

    /// Start one pipeline for the primary source and one per static directory.
    pub fn on_build_complete(self: &Arc<Self>, compilation: Arc<Compilation>) -> PipelineSet {
        let primary = match self.directory() {
            Some(dir) => BatchSource::Directory(dir.to_path_buf()),
            None => BatchSource::Assets,
        };
        let sources = std::iter::once(primary).chain(
            self.config
                .static_dirs
                .iter()
                .map(|dir| BatchSource::StaticDir(dir.clone())),
        );

        let pipelines = sources
            .map(|source| {
                let plugin = Arc::clone(self);
                let compilation = Arc::clone(&compilation);
                let span = info_span!("batch", source = %source);
                let handle = tokio::spawn(
                    {
                        let source = source.clone();
                        async move { plugin.run_batch(source, &compilation).await }
                    }
                    .instrument(span),
                );
                Pipeline::new(source, handle)
            })
            .collect();

        PipelineSet::new(pipelines)
    }

    async fn run_batch(&self, source: BatchSource, compilation: &Compilation) -> BatchOutcome {
        match self.process_batch(&source, compilation).await {
            Ok(results) => {
                debug!(state = ?BatchState::Done);
                BatchOutcome::Done {
                    source,
                    uploaded: results.len(),
                }
            }
            Err(e) => {
                debug!(state = ?BatchState::Errored);
                compilation.record_error(e);
                BatchOutcome::Errored { source }
            }
        }
    }

    async fn process_batch(
        &self,
        source: &BatchSource,
        compilation: &Compilation,
    ) -> Result<Vec<UploadResult>> {
        debug!(state = ?BatchState::Enumerating);
        let files = match source {
            BatchSource::Directory(dir) | BatchSource::StaticDir(dir) => {
                let excludes = WalkExcludes::new(self.config.exclude.as_slice());
                files::enumerate_directory(dir.clone(), excludes).await?
            }
            BatchSource::Assets => files::asset_files(compilation),
        };

        debug!(state = ?BatchState::Filtering, count = files.len());
        let results = self.handle_files(files).await?;
        info!(uploaded = results.len(), "Batch complete");
        Ok(results)
    }
}

impl Plugin for GcsUploadPlugin {
    fn apply(self: Arc<Self>, compiler: &mut Compiler) -> Result<()> {
        self.connect()?;

        let directory =
            resolve_directory(self.config.directory.as_deref(), &compiler.options.output);
        info!(directory = %directory.display(), "Uploading from");
        // Keeps the first resolution if applied to several compilers.
        let _ = self.directory.set(directory);

        let plugin = Arc::clone(&self);
        compiler.on_done(Box::new(move |compilation: Arc<Compilation>| {
            plugin.on_build_complete(compilation)
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompilerOptions;
    use crate::config::StorageOptions;
    use crate::storage::{MockConnector, MockStorageClient};

    fn options() -> PluginOptions {
        PluginOptions::new()
            .storage_options(StorageOptions::new("GOOG1EXAMPLE", "secret"))
            .bucket_name("assets")
    }

    fn connector_once() -> MockConnector {
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .times(1)
            .returning(|_| Ok(Arc::new(MockStorageClient::new()) as Arc<dyn StorageClient>));
        connector
    }

    #[test]
    fn test_resolve_directory_precedence() {
        let output = OutputOptions {
            path: Some(PathBuf::from("build")),
            context: Some(PathBuf::from("/project")),
        };
        assert_eq!(
            resolve_directory(Some(Path::new("dist")), &output),
            PathBuf::from("dist")
        );
        assert_eq!(resolve_directory(None, &output), PathBuf::from("build"));

        let context_only = OutputOptions {
            path: None,
            context: Some(PathBuf::from("/project")),
        };
        assert_eq!(resolve_directory(None, &context_only), PathBuf::from("/project"));
        assert_eq!(
            resolve_directory(None, &OutputOptions::default()),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_connect_twice_creates_one_client() {
        let plugin =
            GcsUploadPlugin::with_connector(options().validate().unwrap(), Arc::new(connector_once()));
        let first = plugin.connect().unwrap();
        let second = plugin.connect().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_new_rejects_invalid_options_before_connecting() {
        let result = GcsUploadPlugin::new(PluginOptions::new().bucket_name("assets"));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_resolves_directory_and_registers_hook() {
        let plugin = Arc::new(GcsUploadPlugin::with_connector(
            options().validate().unwrap(),
            Arc::new(connector_once()),
        ));
        assert!(plugin.directory().is_none());

        let mut compiler = Compiler::new(CompilerOptions {
            output: OutputOptions {
                path: Some(PathBuf::from("build")),
                context: None,
            },
        });
        compiler.apply(plugin.clone()).unwrap();

        assert_eq!(plugin.directory(), Some(Path::new("build")));
        assert_eq!(compiler.done_hook_count(), 1);
    }

    #[test]
    fn test_configured_directory_is_known_before_apply() {
        let plugin = GcsUploadPlugin::with_connector(
            options().directory("dist").validate().unwrap(),
            Arc::new(MockConnector::new()),
        );
        assert_eq!(plugin.directory(), Some(Path::new("dist")));
    }

    #[tokio::test]
    async fn test_force_create_bucket_checks_once() {
        let mut client = MockStorageClient::new();
        client.expect_ensure_bucket().times(1).returning(|_| Ok(()));
        client.expect_upload().returning(|bucket, file, request| {
            Ok(UploadResult {
                name: file.name.clone(),
                path: file.path.clone(),
                bucket: bucket.to_string(),
                destination: request.destination.clone(),
                e_tag: None,
                size: 0,
            })
        });
        let client: Arc<dyn StorageClient> = Arc::new(client);
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .times(1)
            .returning(move |_| Ok(Arc::clone(&client)));

        let plugin = GcsUploadPlugin::with_connector(
            options().force_create_bucket(true).validate().unwrap(),
            Arc::new(connector),
        );
        let files = vec![File::new("a.js", "dist/a.js")];
        let (first, second) = tokio::join!(
            plugin.upload_files(files.clone()),
            plugin.upload_files(files)
        );
        assert_eq!(first.unwrap().len(), 1);
        assert_eq!(second.unwrap().len(), 1);
    }

    #[test]
    fn test_filter_files_drops_ignored() {
        let plugin = GcsUploadPlugin::with_connector(
            options().exclude(["\\.map$"]).validate().unwrap(),
            Arc::new(MockConnector::new()),
        );
        let files = vec![
            File::new("app.js", "dist/app.js"),
            File::new("app.js.map", "dist/app.js.map"),
            File::new(".DS_Store", "dist/.DS_Store"),
        ];
        assert_eq!(plugin.filter_files(files), vec![File::new("app.js", "dist/app.js")]);
    }
}
