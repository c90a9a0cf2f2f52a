//! The bundler side of the plugin contract: output options and the
//! build-complete hook

use crate::compilation::Compilation;
use crate::error::Result;
use crate::pipeline::PipelineSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the bundler writes its output
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub path: Option<PathBuf>,
    pub context: Option<PathBuf>,
}

/// Bundler options visible to plugins
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub output: OutputOptions,
}

/// Callback fired once per completed build
pub type DoneHook = Box<dyn Fn(Arc<Compilation>) -> PipelineSet + Send + Sync>;

/// Something that hooks into a compiler
pub trait Plugin: Send + Sync {
    fn apply(self: Arc<Self>, compiler: &mut Compiler) -> Result<()>;
}

/// Minimal bundler host
#[derive(Default)]
pub struct Compiler {
    pub options: CompilerOptions,
    done_hooks: Vec<DoneHook>,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            done_hooks: Vec::new(),
        }
    }

    pub fn apply(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        plugin.apply(self)
    }

    /// Register a build-complete callback.
    pub fn on_done(&mut self, hook: DoneHook) {
        self.done_hooks.push(hook);
    }

    pub fn done_hook_count(&self) -> usize {
        self.done_hooks.len()
    }

    /// Fire every build-complete callback. Must run inside a Tokio runtime.
    pub fn emit_done(&self, compilation: Arc<Compilation>) -> Vec<PipelineSet> {
        self.done_hooks
            .iter()
            .map(|hook| hook(Arc::clone(&compilation)))
            .collect()
    }
}
