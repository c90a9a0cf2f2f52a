//! Build handle handed to build-complete hooks, and error collection on it

use crate::error::Error;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::warn;

/// Any error a plugin attaches to a build
pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// An asset emitted by the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// On-disk location of the emitted file
    pub exists_at: PathBuf,
}

/// A failure wrapped with the plugin prefix before it is attached to a build
#[derive(Error, Debug)]
#[error("{}: {source}", crate::PLUGIN_NAME)]
pub struct PluginError {
    #[source]
    source: Error,
}

impl PluginError {
    pub fn new(source: Error) -> Self {
        Self { source }
    }

    pub fn inner(&self) -> &Error {
        &self.source
    }
}

/// The result of one completed build.
///
/// Shared between concurrently running pipelines, so the error list sits
/// behind a mutex. It starts absent and is created by the first recorded
/// error.
#[derive(Debug, Default)]
pub struct Compilation {
    assets: BTreeMap<String, Asset>,
    errors: Mutex<Option<Vec<BuildError>>>,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_asset(&mut self, name: impl Into<String>, exists_at: impl Into<PathBuf>) {
        self.assets.insert(
            name.into(),
            Asset {
                exists_at: exists_at.into(),
            },
        );
    }

    pub fn assets(&self) -> &BTreeMap<String, Asset> {
        &self.assets
    }

    /// Attach an error of any kind to the build.
    pub fn push_error(&self, error: BuildError) {
        self.lock_errors().get_or_insert_with(Vec::new).push(error);
    }

    /// Wrap a plugin failure and attach it to the build. Never fails.
    pub fn record_error(&self, error: Error) {
        let error = PluginError::new(error);
        warn!("{}", error);
        self.push_error(Box::new(error));
    }

    pub fn has_errors(&self) -> bool {
        self.lock_errors().as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn error_count(&self) -> usize {
        self.lock_errors().as_ref().map_or(0, Vec::len)
    }

    /// Rendered messages of every recorded error.
    pub fn error_messages(&self) -> Vec<String> {
        self.lock_errors()
            .as_ref()
            .map(|errors| errors.iter().map(|e| e.to_string()).collect())
            .unwrap_or_default()
    }

    /// Take the error list, leaving it absent.
    pub fn take_errors(&self) -> Option<Vec<BuildError>> {
        self.lock_errors().take()
    }

    fn lock_errors(&self) -> MutexGuard<'_, Option<Vec<BuildError>>> {
        // A panicking recorder must not stop others from reporting.
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
