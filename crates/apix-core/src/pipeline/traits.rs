//! Pipeline contracts and supporting types.
//!
//! The engine runs one request through three steps:
//! 1. **Route selection** -- pick the first route whose condition holds
//! 2. **Queue construction** -- expand the route into [`ResolvedExtension`]s
//! 3. **Execution** -- call each stage's service through a
//!    [`ServiceInvoker`] and let its status code steer the run
//!
//! The only network-facing seam is [`ServiceInvoker`]; everything else in
//! this module is plain data.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use apix_types::extension::{Directive, ExtensionConfig, ResponseRouting, ServiceDescriptor};
use apix_types::request::StageResult;

/// Status code of the fixed rejection response.
pub const REJECTION_STATUS: u16 = 400;

/// Body of the fixed rejection response.
pub const REJECTION_BODY: &str = "Request rejected by extension processing.";

// ── Service invocation ──────────────────────────────────────────────────

/// Transport-level failure while calling an extension service.
///
/// Receiving any status code, including 4xx and 5xx, is not an
/// [`InvokeError`]; only failing to obtain a response is.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The service could not be reached or the exchange broke off.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request could not be built (bad URI, bad header, bad method).
    #[error("invalid service request: {0}")]
    InvalidRequest(String),
}

/// Performs one network call per stage.
///
/// Implementations must not retry: the executor relies on every stage
/// being invoked at most once.
#[async_trait]
pub trait ServiceInvoker: Send + Sync {
    /// Call `service` with the current payload.
    async fn invoke(
        &self,
        service: &ServiceDescriptor,
        payload: &[u8],
    ) -> Result<StageResult, InvokeError>;
}

// ── Queue entries ───────────────────────────────────────────────────────

/// A runnable stage: an extension that passed activity and condition checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedExtension {
    /// Extension name.
    pub name: String,

    /// The service to call.
    pub service: ServiceDescriptor,

    /// Status code to directive mapping.
    pub response_routing: ResponseRouting,
}

impl From<&ExtensionConfig> for ResolvedExtension {
    fn from(ext: &ExtensionConfig) -> Self {
        Self {
            name: ext.name.clone(),
            service: ext.service.clone(),
            response_routing: ext.response_routing.clone(),
        }
    }
}

// ── Per-request state ───────────────────────────────────────────────────

/// Terminal phase of a pipeline run.
///
/// A run is `Running` for as long as the executor holds its
/// [`PipelineState`]; the phase it ends in is carried by the
/// [`PipelineOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Every queued stage forwarded.
    Completed,
    /// A stage mapped to [`Directive::TerminateError`].
    Errored,
}

/// Mutable state owned by the executor for the duration of one request.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Payload handed to the next stage.
    pub payload: Vec<u8>,

    /// Status code of the last executed stage.
    pub last_status: Option<u16>,
}

impl PipelineState {
    /// Fresh state seeded with the request payload.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            last_status: None,
        }
    }

    /// Fold a stage result into the state.
    ///
    /// The payload is replaced only by a non-empty body. Returns whether
    /// it was replaced.
    pub fn absorb(&mut self, result: StageResult) -> bool {
        self.last_status = Some(result.status);
        if result.has_body() {
            self.payload = result.body;
            true
        } else {
            false
        }
    }
}

// ── Run report ──────────────────────────────────────────────────────────

/// What happened in one executed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    /// Extension name.
    pub extension: String,

    /// Status code returned by the service.
    pub status: u16,

    /// Directive the status code resolved to.
    pub directive: Directive,

    /// Whether the stage's body replaced the payload.
    pub payload_replaced: bool,

    /// Wall-clock time spent in the stage.
    pub elapsed_ms: u64,
}

/// Terminal result of a pipeline that was not aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The queue was exhausted.
    Completed {
        /// Final payload.
        payload: Vec<u8>,
        /// Status of the last executed stage, or the empty-queue default.
        status: u16,
    },

    /// A stage's status code mapped to [`Directive::TerminateError`].
    Rejected {
        /// Extension that rejected the request.
        extension: String,
        /// Status code that extension returned.
        stage_status: u16,
    },
}

impl PipelineOutcome {
    /// Status code to answer the caller with.
    pub fn status(&self) -> u16 {
        match self {
            PipelineOutcome::Completed { status, .. } => *status,
            PipelineOutcome::Rejected { .. } => REJECTION_STATUS,
        }
    }

    /// Body to answer the caller with.
    pub fn body(&self) -> &[u8] {
        match self {
            PipelineOutcome::Completed { payload, .. } => payload,
            PipelineOutcome::Rejected { .. } => REJECTION_BODY.as_bytes(),
        }
    }

    /// Terminal phase this outcome corresponds to.
    pub fn phase(&self) -> Phase {
        match self {
            PipelineOutcome::Completed { .. } => Phase::Completed,
            PipelineOutcome::Rejected { .. } => Phase::Errored,
        }
    }

    /// Whether the request was rejected by a stage.
    pub fn is_rejected(&self) -> bool {
        matches!(self, PipelineOutcome::Rejected { .. })
    }
}

/// Full report of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Label of the selected route.
    pub route: String,

    /// How the run ended.
    pub outcome: PipelineOutcome,

    /// Executed stages, in order.
    pub stages: Vec<StageRecord>,
}

/// Dry-run result: the route and queue a request would get.
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    /// Label of the selected route.
    pub route: String,

    /// Position of the route in the table.
    pub route_index: usize,

    /// Stages that would run, in order.
    pub queue: Vec<ResolvedExtension>,
}
