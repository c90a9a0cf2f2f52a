//! GCS client over the S3-interoperable XML API, using the AWS S3 SDK

use crate::config::StorageOptions;
use crate::error::{Error, Result};
use crate::files::File;
use crate::storage::{Connector, StorageClient, UploadRequest, UploadResult};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use flate2::{write::GzEncoder, Compression};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// Client for a GCS bucket reached through HMAC interoperability keys
pub struct GcsClient {
    client: Client,
    project_id: Option<String>,
}

impl GcsClient {
    /// Create a new client. Does not touch the network.
    pub fn new(options: &StorageOptions) -> Self {
        // Create credentials
        let credentials = Credentials::new(
            &options.access_key_id,
            &options.secret_access_key,
            None,
            None,
            "gcs-upload",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(options.endpoint.clone())
            .region(Region::new(options.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
            project_id: options.project_id.clone(),
        }
    }

    /// Check whether a bucket exists
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e.as_service_error().is_some_and(|se| se.is_not_found())
                    || e.raw_response().is_some_and(|r| r.status().as_u16() == 404);
                if not_found {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Create a bucket
    pub async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let request = self.client.create_bucket().bucket(bucket);
        match self.project_id.clone() {
            // GCS places new buckets in the project named by this header
            Some(project_id) => {
                request
                    .customize()
                    .mutate_request(move |req| {
                        req.headers_mut()
                            .insert("x-goog-project-id", project_id.clone());
                    })
                    .send()
                    .await?;
            }
            None => {
                request.send().await?;
            }
        }

        info!(bucket, "Created bucket");
        Ok(())
    }
}

#[async_trait]
impl StorageClient for GcsClient {
    async fn upload(
        &self,
        bucket: &str,
        file: &File,
        request: &UploadRequest,
    ) -> Result<UploadResult> {
        let local_path = file.path.as_path();
        let content = tokio::fs::read(local_path).await.map_err(|e| Error::Upload {
            path: local_path.to_path_buf(),
            destination: request.destination.clone(),
            message: e.to_string(),
        })?;

        // Detect content type
        let content_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        let body = if request.gzip {
            gzip(&content)?
        } else {
            content
        };
        let size = body.len() as u64;

        debug!(
            path = %local_path.display(),
            destination = %request.destination,
            size,
            "Uploading"
        );

        let response = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&request.destination)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .set_content_encoding(request.gzip.then(|| "gzip".to_string()))
            .set_acl(request.public.then_some(ObjectCannedAcl::PublicRead))
            .set_metadata((!request.metadata.is_empty()).then(|| request.metadata.clone()))
            .send()
            .await
            .map_err(|e| Error::Upload {
                path: local_path.to_path_buf(),
                destination: request.destination.clone(),
                message: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;

        Ok(UploadResult {
            name: file.name.clone(),
            path: local_path.to_path_buf(),
            bucket: bucket.to_string(),
            destination: request.destination.clone(),
            e_tag: response.e_tag().map(str::to_string),
            size,
        })
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        if !self.bucket_exists(bucket).await? {
            self.create_bucket(bucket).await?;
        }
        Ok(())
    }
}

/// Compress a body for `Content-Encoding: gzip`.
fn gzip(content: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(content.len() / 2), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

/// Connects [`GcsClient`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct GcsConnector;

impl Connector for GcsConnector {
    fn connect(&self, options: &StorageOptions) -> Result<Arc<dyn StorageClient>> {
        info!(endpoint = %options.endpoint, "Connecting to storage");
        Ok(Arc::new(GcsClient::new(options)))
    }
}
