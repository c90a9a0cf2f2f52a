//! Storage service seam: connector, client and bucket handles

use crate::config::StorageOptions;
use crate::error::{Error, Result};
use crate::files::File;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[cfg(test)]
use mockall::automock;

/// Options of a single upload request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    pub destination: String,
    pub gzip: bool,
    pub public: bool,
    pub metadata: HashMap<String, String>,
}

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Name of the uploaded file
    pub name: String,
    pub path: PathBuf,
    pub bucket: String,
    pub destination: String,
    pub e_tag: Option<String>,
    /// Bytes sent, after compression
    pub size: u64,
}

/// A connected storage service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload a local file into `bucket`.
    async fn upload(&self, bucket: &str, file: &File, request: &UploadRequest)
        -> Result<UploadResult>;

    /// Create `bucket` unless it already exists.
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;
}

/// Creates storage clients
#[cfg_attr(test, automock)]
pub trait Connector: Send + Sync {
    fn connect(&self, options: &StorageOptions) -> Result<Arc<dyn StorageClient>>;
}

/// A named bucket on a shared client
#[derive(Clone)]
pub struct Bucket {
    client: Arc<dyn StorageClient>,
    name: String,
}

impl Bucket {
    pub fn new(client: Arc<dyn StorageClient>, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn upload(&self, file: &File, request: &UploadRequest) -> Result<UploadResult> {
        self.client.upload(&self.name, file, request).await
    }

    pub async fn ensure_exists(&self) -> Result<()> {
        self.client.ensure_bucket(&self.name).await
    }
}

/// A client that is created on first use and then reused.
#[derive(Default)]
pub struct LazyClient {
    client: Mutex<Option<Arc<dyn StorageClient>>>,
}

impl LazyClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the client, connecting first if nothing is connected yet.
    pub fn get_or_connect(
        &self,
        connector: &dyn Connector,
        options: &StorageOptions,
    ) -> Result<Arc<dyn StorageClient>> {
        let mut slot = self
            .client
            .lock()
            .map_err(|_| Error::Storage("client lock poisoned".to_string()))?;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = connector.connect(options)?;
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    pub fn is_connected(&self) -> bool {
        self.client.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}
