//! Concurrent upload of a batch of files

use crate::config::UploadConfig;
use crate::error::Result;
use crate::files::File;
use crate::storage::{Bucket, UploadRequest, UploadResult};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Uploads batches of files to one bucket
#[derive(Clone)]
pub struct Uploader {
    bucket: Bucket,
    config: Arc<UploadConfig>,
}

impl Uploader {
    pub fn new(bucket: Bucket, config: Arc<UploadConfig>) -> Self {
        Self { bucket, config }
    }

    /// Request for one file, from the user callbacks and upload flags.
    pub fn request_for(&self, file: &File) -> UploadRequest {
        UploadRequest {
            destination: (self.config.destination_name_fn)(file),
            gzip: self.config.gzip,
            public: self.config.make_public,
            metadata: (self.config.metadata_fn)(file),
        }
    }

    /// Upload every file concurrently.
    ///
    /// Results are in input order. The first failure fails the batch; uploads
    /// already in flight keep running as detached tasks and their outcomes are
    /// dropped. The user callbacks run inside each task, so a panicking
    /// callback fails the batch with [`Error::Join`](crate::Error::Join).
    pub async fn upload_files(&self, files: Vec<File>) -> Result<Vec<UploadResult>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let count = files.len();
        let tasks = files.into_iter().map(|file| {
            let uploader = self.clone();
            tokio::spawn(async move {
                let request = uploader.request_for(&file);
                debug!(file = %file.name, destination = %request.destination, "Upload started");
                uploader.bucket.upload(&file, &request).await
            })
        });

        let results = try_join_all(tasks.map(|task| async move { task.await? })).await?;

        info!(count, bucket = self.bucket.name(), "Uploaded files");
        Ok(results)
    }
}
