//! Error types for the montage pipeline.
//!
//! Only failures that abort a single module live here. Template and style
//! compiler diagnostics are data (see [`crate::diagnostic::Message`]) and never
//! travel as errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fatal, per-module pipeline error.
///
/// `Clone` so that one failed single-flight computation can hand the same
/// rejection to every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MontageError {
    /// Reading a physical file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// SFC parser collaborator rejected the file.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The script block declares no dialect, or one outside `ts`, `tsx`,
    /// `js` and `jsx`.
    #[error("Fail to resolve script type in {}: unsupported lang \"{lang}\"", path.display())]
    UnsupportedScriptLang { path: PathBuf, lang: String },

    /// The embedded-markup transform returned nothing.
    #[error("Fail to transform vue script to {lang} in {}", path.display())]
    ScriptTransform { path: PathBuf, lang: String },

    /// A template load was requested for a component without `<template>`.
    #[error("Missing template in {}", path.display())]
    MissingTemplate { path: PathBuf },

    /// A derived request arrived before the `file` load of its component.
    #[error("No component context for {}; it must be loaded in the file namespace first", path.display())]
    MissingContext { path: PathBuf },

    /// A style request points past the component's style blocks.
    #[error("Style index {index} is out of range for {} ({len} style blocks)", path.display())]
    StyleIndexOutOfRange {
        path: PathBuf,
        index: usize,
        len: usize,
    },

    /// An optional capability was needed but not provided.
    #[error("Missing optional dependency \"{package}\" required for {purpose}")]
    MissingOptional { package: String, purpose: String },

    /// A virtual path query could not be decoded.
    #[error("Invalid virtual path: {0}")]
    InvalidVirtualPath(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external collaborator (HTML generator, host) failed.
    #[error("{0}")]
    External(String),
}

impl MontageError {
    /// Wrap an IO error for `path`.
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source: Arc::new(err),
        }
    }

    /// Optional dependency missing at first use.
    pub fn missing_optional(package: &str, purpose: &str) -> Self {
        Self::MissingOptional {
            package: package.to_string(),
            purpose: purpose.to_string(),
        }
    }
}

/// Result type for montage operations.
pub type MontageResult<T> = Result<T, MontageError>;
