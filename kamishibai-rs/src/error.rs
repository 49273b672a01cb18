//! Error taxonomy for parsing, loading, jumping, and evaluation.
//!
//! Scripts are parsed eagerly at load time, so a structurally invalid script
//! never reaches the conductor: [`LoadError`] surfaces before a script
//! becomes current. The errors that can still occur while stepping —
//! [`LabelNotFoundError`] and [`EvalError`] — propagate synchronously out of
//! the call that hit them; nothing is swallowed mid-playback.

use std::path::PathBuf;

use thiserror::Error;

/// A structurally invalid script line, detected during eager parsing.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("parse error at line {line}: {message}")]
pub struct ParseError {
    /// 1-based source line number.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

/// A jump target absent from the active script.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("label not found: {label}")]
pub struct LabelNotFoundError {
    pub label: String,
}

impl LabelNotFoundError {
    pub fn new(label: impl Into<String>) -> Self {
        LabelNotFoundError {
            label: label.into(),
        }
    }
}

/// A script or text file that could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents did not parse.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// Path of the file the load was for.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => path,
        }
    }
}

/// The evaluator rejected an expression, during entity substitution or
/// embedded-code execution.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("eval error in `{expr}`: {message}")]
pub struct EvalError {
    /// The expression as handed to the evaluator (without the `&` prefix).
    pub expr: String,
    pub message: String,
}

impl EvalError {
    pub fn new(expr: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError {
            expr: expr.into(),
            message: message.into(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
