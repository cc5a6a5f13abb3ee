//! Sequential stage execution.
//!
//! The executor owns the per-request [`PipelineState`]. It invokes one
//! stage at a time, folds the result into the state, resolves the
//! stage's directive and only then moves on. Nothing is retried.
//!
//! Before each stage it checks the cancellation token and the overall
//! deadline. Each stage then runs under the smaller of the per-stage
//! timeout and the time left before the deadline; cancellation observed
//! mid-stage drops the in-flight call.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use apix_types::config::PipelineSettings;
use apix_types::error::{ConfigError, PipelineError};
use apix_types::extension::Directive;
use apix_types::request::StageResult;

use super::response_router::route_response;
use super::traits::{
    InvokeError, PipelineOutcome, PipelineRun, PipelineState, ResolvedExtension,
    ServiceInvoker, StageRecord,
};

/// Time limit applied to a single stage.
#[derive(Debug, Clone, Copy)]
struct StageBudget {
    limit: Duration,
    /// The limit comes from the overall deadline rather than the stage timeout.
    deadline_bound: bool,
}

/// Runs a resolved extension queue.
pub struct PipelineExecutor {
    invoker: Arc<dyn ServiceInvoker>,
    settings: PipelineSettings,
}

impl PipelineExecutor {
    /// Create an executor.
    pub fn new(invoker: Arc<dyn ServiceInvoker>, settings: PipelineSettings) -> Self {
        Self { invoker, settings }
    }

    /// Timing settings in effect.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Execute `queue` starting from `payload`.
    ///
    /// Returns the run report when the pipeline completes or a stage
    /// rejects the request. Any fatal condition aborts immediately with a
    /// [`PipelineError`] and no partial output.
    pub async fn execute(
        &self,
        route: &str,
        queue: &[ResolvedExtension],
        payload: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<PipelineRun, PipelineError> {
        let deadline = self
            .settings
            .deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let mut state = PipelineState::new(payload);
        let mut stages = Vec::with_capacity(queue.len());

        if queue.is_empty() {
            debug!(route, status = self.settings.empty_queue_status, "empty extension queue");
        }

        for ext in queue {
            if cancel.is_cancelled() {
                warn!(route, extension = %ext.name, "pipeline cancelled");
                return Err(PipelineError::Cancelled {
                    extension: ext.name.clone(),
                });
            }
            let budget = self.stage_budget(ext, deadline)?;

            let started = Instant::now();
            let result = self.invoke_stage(ext, &state.payload, budget, cancel).await?;
            let status = result.status;
            let payload_replaced = state.absorb(result);

            let directive = route_response(&ext.name, status, &ext.response_routing)
                .inspect_err(|e| warn!(route, extension = %ext.name, status, error = %e, "unrouted status"))?;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            debug!(
                route,
                extension = %ext.name,
                status,
                %directive,
                payload_replaced,
                elapsed_ms,
                "stage finished"
            );

            stages.push(StageRecord {
                extension: ext.name.clone(),
                status,
                directive,
                payload_replaced,
                elapsed_ms,
            });

            match directive {
                Directive::Forward => {}
                Directive::TerminateError => {
                    info!(route, extension = %ext.name, status, "request rejected by extension");
                    return Ok(PipelineRun {
                        route: route.to_string(),
                        outcome: PipelineOutcome::Rejected {
                            extension: ext.name.clone(),
                            stage_status: status,
                        },
                        stages,
                    });
                }
                other => {
                    return Err(PipelineError::Config(ConfigError::Invalid {
                        reason: format!(
                            "extension '{}' routed status {status} to unsupported directive '{other}'",
                            ext.name
                        ),
                    }));
                }
            }
        }

        let status = state
            .last_status
            .unwrap_or(self.settings.empty_queue_status);
        Ok(PipelineRun {
            route: route.to_string(),
            outcome: PipelineOutcome::Completed {
                payload: state.payload,
                status,
            },
            stages,
        })
    }

    /// Work out the time limit for the next stage.
    fn stage_budget(
        &self,
        ext: &ResolvedExtension,
        deadline: Option<Instant>,
    ) -> Result<Option<StageBudget>, PipelineError> {
        let stage = self.settings.stage_timeout();
        let remaining = match deadline {
            Some(at) => {
                let now = Instant::now();
                if now >= at {
                    return Err(self.deadline_exceeded(ext));
                }
                Some(at - now)
            }
            None => None,
        };

        Ok(match (stage, remaining) {
            (Some(s), Some(r)) if r < s => Some(StageBudget {
                limit: r,
                deadline_bound: true,
            }),
            (Some(s), _) => Some(StageBudget {
                limit: s,
                deadline_bound: false,
            }),
            (None, Some(r)) => Some(StageBudget {
                limit: r,
                deadline_bound: true,
            }),
            (None, None) => None,
        })
    }

    async fn invoke_stage(
        &self,
        ext: &ResolvedExtension,
        payload: &[u8],
        budget: Option<StageBudget>,
        cancel: &CancellationToken,
    ) -> Result<StageResult, PipelineError> {
        debug!(
            extension = %ext.name,
            uri = %ext.service.uri,
            method = %ext.service.method,
            payload_bytes = payload.len(),
            "invoking extension service"
        );

        let call = self.invoker.invoke(&ext.service, payload);
        let bounded = async {
            match budget {
                Some(b) => tokio::time::timeout(b.limit, call).await.map_err(|_| b),
                None => Ok(call.await),
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(extension = %ext.name, "pipeline cancelled mid-stage");
                return Err(PipelineError::Cancelled { extension: ext.name.clone() });
            }
            outcome = bounded => outcome,
        };

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(InvokeError::InvalidRequest(reason))) => {
                warn!(extension = %ext.name, uri = %ext.service.uri, %reason, "extension service request is invalid");
                Err(PipelineError::Config(ConfigError::Invalid {
                    reason: format!("extension '{}' has an unusable service: {reason}", ext.name),
                }))
            }
            Ok(Err(e)) => {
                warn!(extension = %ext.name, uri = %ext.service.uri, error = %e, "extension service unavailable");
                Err(PipelineError::ServiceUnavailable {
                    extension: ext.name.clone(),
                    uri: ext.service.uri.clone(),
                    reason: e.to_string(),
                })
            }
            Err(b) if b.deadline_bound => Err(self.deadline_exceeded(ext)),
            Err(b) => {
                warn!(extension = %ext.name, timeout_ms = b.limit.as_millis() as u64, "extension service timed out");
                Err(PipelineError::ServiceUnavailable {
                    extension: ext.name.clone(),
                    uri: ext.service.uri.clone(),
                    reason: format!("timed out after {}ms", b.limit.as_millis()),
                })
            }
        }
    }

    fn deadline_exceeded(&self, ext: &ResolvedExtension) -> PipelineError {
        let budget_ms = self.settings.deadline_ms.unwrap_or_default();
        warn!(extension = %ext.name, budget_ms, "pipeline deadline exceeded");
        PipelineError::DeadlineExceeded {
            extension: ext.name.clone(),
            budget_ms,
        }
    }
}
