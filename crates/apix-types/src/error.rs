//! Error types for the apix gateway.
//!
//! [`PipelineError`] is what the engine surfaces to its caller when a
//! request is aborted. Every variant is fatal for the request: a
//! controlled rejection by an extension is *not* an error and is modeled
//! as an outcome instead. [`ConfigError`] covers broken configuration,
//! whether it is detected while loading or while a request is running.

use thiserror::Error;

/// Configuration errors.
///
/// The first two variants are raised per request, when a route or a
/// response routing table turns out to be unusable for the request at
/// hand. The rest are raised while loading configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// A route references an extension that is not in the registry.
    #[error("route '{route}' references unknown extension '{name}'")]
    UnknownExtension {
        /// Label of the route holding the reference.
        route: String,
        /// The extension name that could not be resolved.
        name: String,
    },

    /// A stage returned a status code that its response routing table
    /// maps neither exactly nor through a `"*"` wildcard.
    #[error("extension '{extension}' has no response routing for status {status}")]
    UnroutedStatus {
        /// Extension whose routing table is incomplete.
        extension: String,
        /// The status code that could not be routed.
        status: u16,
    },

    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A configuration document could not be parsed.
    #[error("failed to parse config {path}: {reason}")]
    Parse {
        /// Path of the document.
        path: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Underlying I/O error while reading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal pipeline errors.
///
/// Each variant aborts the whole request immediately. None of them is
/// retried and none of them is converted into a client-facing rejection
/// by the engine; mapping them to a response is the caller's job.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// No route in the table accepted the request.
    #[error("no route matched {method} {uri}")]
    NoRouteMatched {
        /// Request method.
        method: String,
        /// Request URI.
        uri: String,
    },

    /// The configuration could not serve this request.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A stage's service could not be reached or did not answer in time.
    #[error("extension '{extension}' unavailable at {uri}: {reason}")]
    ServiceUnavailable {
        /// Extension whose invocation failed.
        extension: String,
        /// Service URI that was called.
        uri: String,
        /// Transport-level failure description.
        reason: String,
    },

    /// The overall pipeline deadline ran out.
    #[error("pipeline deadline of {budget_ms}ms exceeded before extension '{extension}' completed")]
    DeadlineExceeded {
        /// Extension that was pending when the budget ran out.
        extension: String,
        /// The configured budget.
        budget_ms: u64,
    },

    /// The pipeline was cancelled (e.g. on shutdown).
    #[error("pipeline cancelled before extension '{extension}' completed")]
    Cancelled {
        /// Extension that was pending when cancellation was observed.
        extension: String,
    },
}

impl PipelineError {
    /// Whether this error stems from broken configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, PipelineError::Config(_))
    }

    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NoRouteMatched { .. } => "no_route_matched",
            PipelineError::Config(_) => "config_error",
            PipelineError::ServiceUnavailable { .. } => "service_unavailable",
            PipelineError::DeadlineExceeded { .. } => "deadline_exceeded",
            PipelineError::Cancelled { .. } => "cancelled",
        }
    }
}

/// A convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PipelineError>;
