//! Shared engine resources: script loading, the parsed-script cache, the
//! variable scopes, and the pluggable expression evaluator.
//!
//! A [`Resource`] is owned by the conductor and handed everything that must
//! outlive a single script: loaded masters stay cached so revisiting a scene
//! re-parses nothing, and variables written by one script are visible to the
//! next.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{EvalError, LoadError};
use crate::expr::ExprEvaluator;
use crate::script::Script;
use crate::tag::Value;
use crate::vars::VarScopes;

/// Evaluates one embedded-code expression against the variable scopes.
///
/// Implementations may keep interpreter state between calls; the default is
/// the built-in expression language ([`ExprEvaluator`]).
pub trait Evaluator {
    fn evaluate(&mut self, expr: &str, vars: &mut VarScopes) -> Result<Value, EvalError>;
}

pub struct Resource {
    base_dir: PathBuf,
    cache: HashMap<String, Script>,
    cache_enabled: bool,
    vars: VarScopes,
    evaluator: Box<dyn Evaluator>,
}

impl Resource {
    /// Resource rooted at `base_dir`, caching enabled, built-in evaluator.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Resource::with_evaluator(base_dir, Box::new(ExprEvaluator::new()))
    }

    pub fn with_evaluator(base_dir: impl Into<PathBuf>, evaluator: Box<dyn Evaluator>) -> Self {
        Resource {
            base_dir: base_dir.into(),
            cache: HashMap::new(),
            cache_enabled: true,
            vars: VarScopes::new(),
            evaluator,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Disabling the cache also drops any cached masters.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
        if !enabled {
            self.cache.clear();
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // An absolute identifier wins over the base directory.
        self.base_dir.join(path)
    }

    /// Raw file contents for `path`, resolved against the base directory.
    pub async fn load_text(&self, path: &str) -> Result<String, LoadError> {
        let full = self.resolve(path);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| LoadError::Io { path: full, source })
    }

    /// Parsed script for `path`, with its cursor at the first tag.
    ///
    /// With caching on, the first load parses and stores a master; this and
    /// every later load return an independent fork of it, so each caller gets
    /// a private cursor over shared tags. Disk changes after the first load
    /// are not seen until the cache is cleared.
    pub async fn load_script(&mut self, path: &str) -> Result<Script, LoadError> {
        if self.cache_enabled {
            if let Some(master) = self.cache.get(path) {
                tracing::debug!(path, "script cache hit");
                return Ok(master.fork());
            }
        }

        let text = self.load_text(path).await?;
        let script = Script::new(&text).map_err(|source| LoadError::Parse {
            path: self.resolve(path),
            source,
        })?;
        tracing::debug!(path, tags = script.len(), "script parsed");

        if self.cache_enabled {
            let fork = script.fork();
            self.cache.insert(path.to_owned(), script);
            return Ok(fork);
        }
        Ok(script)
    }

    /// Run one expression through the configured evaluator.
    pub fn eval(&mut self, expr: &str) -> Result<Value, EvalError> {
        self.evaluator.evaluate(expr, &mut self.vars)
    }

    pub fn vars(&self) -> &VarScopes {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarScopes {
        &mut self.vars
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
