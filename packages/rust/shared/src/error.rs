//! Error types for ContentForge.
//!
//! Library crates use [`ContentForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ContentForge operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentForgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Brand or request document violates policy. Carries the complete
    /// violation list, one rendered message per entry.
    #[error("validation failed:\n{}", .violations.iter().map(|v| format!("- {v}")).collect::<Vec<_>>().join("\n"))]
    Validation { violations: Vec<String> },

    /// Context build failed. Aggregates every offending source.
    #[error("context build failed:\n{}", .failures.iter().map(|f| format!("- {f}")).collect::<Vec<_>>().join("\n"))]
    ContextBuild { failures: Vec<String> },

    /// Robots policy of the source's host disallows the fetch identity.
    #[error("robots policy disallows fetching {url}")]
    RobotsDisallowed { url: String },

    /// Network/HTTP error during a source fetch (after retries, if transient).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// No route exists for the requested (intent, form, channel) triple.
    #[error("no route for intent={intent} form={form} channel={channel}")]
    Routing {
        intent: String,
        form: String,
        channel: String,
    },

    /// A required pipeline stage failed.
    #[error("pipeline stage {stage} failed: {message}")]
    Stage { stage: String, message: String },

    /// Executor post-condition violated (e.g. a required disclaimer missing).
    #[error("artifact post-condition failed: {message}")]
    PostCondition { message: String },

    /// No registered delivery adapter matches the delivery target.
    #[error("no delivery adapter for channel={channel} destination={destination}")]
    AdapterMismatch {
        channel: String,
        destination: String,
    },

    /// More than one adapter claims the delivery target.
    #[error("ambiguous delivery adapters for channel={channel} destination={destination}: {names:?}")]
    AdapterAmbiguous {
        channel: String,
        destination: String,
        names: Vec<String>,
    },

    /// Cache/artifact persistence error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentForgeError>;

impl ContentForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error from any displayable message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a stage error.
    pub fn stage(stage: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: msg.into(),
        }
    }

    /// Create a post-condition error.
    pub fn post_condition(msg: impl Into<String>) -> Self {
        Self::PostCondition {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
