//! Content compilation façade.
//!
//! Markdown compilation itself belongs to a [`ContentCompiler`]. The pipeline
//! adds the session bookkeeping around it: the dead-link flag checked when a
//! build finishes, and include registration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde_json::Value as Json;

use crate::config::BuildError;
use crate::reload::DevServer;

/// Extension of content files.
pub const CONTENT_EXTENSION: &str = "md";

/// Output of compiling one content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledContent {
    /// Vue SFC source handed to the component plugin.
    pub component_source: String,
    pub page_data: Json,
    pub dead_links: Vec<String>,
    /// Files pulled in by the source; changes to them recompile this file.
    pub includes: Vec<PathBuf>,
}

/// Markdown to component compiler.
pub trait ContentCompiler: Send + Sync {
    fn compile(&self, source: &str, path: &Path, public_dir: &Path) -> Result<CompiledContent>;
}

/// Result of [`ContentPipeline::transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub code: String,
    /// Includes not registered with a dev server (build mode).
    pub includes: Vec<PathBuf>,
}

/// Session-wide wrapper around a [`ContentCompiler`].
pub struct ContentPipeline {
    compiler: Arc<dyn ContentCompiler>,
    has_dead_links: AtomicBool,
}

impl ContentPipeline {
    pub fn new(compiler: Arc<dyn ContentCompiler>) -> Self {
        Self {
            compiler,
            has_dead_links: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_content(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == CONTENT_EXTENSION)
    }

    /// Compile a single file. No session state is touched.
    pub fn compile(&self, source: &str, path: &Path, public_dir: &Path) -> Result<CompiledContent> {
        self.compiler
            .compile(source, path, public_dir)
            .with_context(|| format!("failed to compile {}", path.display()))
    }

    /// Host transform step for content files; `Ok(None)` for anything else.
    ///
    /// Dead links are recorded for [`check_dead_links`](Self::check_dead_links).
    /// Includes are registered with `server` when one is running.
    pub fn transform(
        &self,
        code: &str,
        path: &Path,
        public_dir: &Path,
        server: Option<&dyn DevServer>,
    ) -> Result<Option<Transformed>> {
        if !Self::is_content(path) {
            return Ok(None);
        }

        let compiled = self.compile(code, path, public_dir)?;
        if !compiled.dead_links.is_empty() {
            crate::debug!("content"; "{} dead link(s) in {}", compiled.dead_links.len(), path.display());
            self.has_dead_links.store(true, Ordering::Relaxed);
        }

        let includes = match server {
            Some(server) => {
                for include in &compiled.includes {
                    server.add_watch_file(include);
                }
                Vec::new()
            }
            None => compiled.includes,
        };

        Ok(Some(Transformed {
            code: compiled.component_source,
            includes,
        }))
    }

    #[inline]
    pub fn has_dead_links(&self) -> bool {
        self.has_dead_links.load(Ordering::Relaxed)
    }

    /// Build finalization check.
    pub fn check_dead_links(&self, ignore_dead_links: bool) -> Result<(), BuildError> {
        if self.has_dead_links() && !ignore_dead_links {
            return Err(BuildError::DeadLinks);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentPipeline")
            .field("has_dead_links", &self.has_dead_links())
            .finish_non_exhaustive()
    }
}
