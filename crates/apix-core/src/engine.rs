//! Request orchestration.
//!
//! [`Planner`] does route selection and queue construction;
//! [`Orchestrator`] pairs it with the executor. It is built once from configuration and shared
//! across concurrent requests; it holds no per-request state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use apix_types::config::Config;
use apix_types::extension::ExtensionRegistry;
use apix_types::request::PipelineRequest;
use apix_types::route::RouteConfig;
use apix_types::Result;

use crate::condition::{ConditionEvaluator, StandardEvaluator};
use crate::pipeline::{build_queue, PipelineExecutor, PipelinePlan, PipelineRun, RouteMatcher, ServiceInvoker};

/// Route selection and queue construction.
///
/// Never calls a service, so it needs no invoker; dry runs use it on its
/// own and the [`Orchestrator`] uses it before executing.
pub struct Planner {
    routes: Vec<RouteConfig>,
    registry: ExtensionRegistry,
    evaluator: Arc<dyn ConditionEvaluator>,
}

impl Planner {
    /// Assemble a planner from its parts.
    pub fn new(
        routes: Vec<RouteConfig>,
        registry: ExtensionRegistry,
        evaluator: Arc<dyn ConditionEvaluator>,
    ) -> Self {
        Self {
            routes,
            registry,
            evaluator,
        }
    }

    /// Build from a loaded configuration with the standard evaluator.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.routes.clone(),
            config.registry(),
            Arc::new(StandardEvaluator),
        )
    }

    /// Replace the condition evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// The route table.
    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    /// The extension registry.
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Select the route and build the queue for `request`.
    pub fn plan(&self, request: &PipelineRequest) -> Result<PipelinePlan> {
        let evaluator = self.evaluator.as_ref();
        let (route_index, route) = RouteMatcher::new(&self.routes, evaluator).select(request)?;
        let label = route.label(route_index);
        let queue = build_queue(route, &label, &self.registry, evaluator, request)?;

        Ok(PipelinePlan {
            route: label,
            route_index,
            queue,
        })
    }
}

/// Runs inbound requests through the configured extension pipeline.
pub struct Orchestrator {
    planner: Planner,
    executor: PipelineExecutor,
}

impl Orchestrator {
    /// Assemble an orchestrator from its parts.
    pub fn new(planner: Planner, executor: PipelineExecutor) -> Self {
        Self { planner, executor }
    }

    /// Build from a loaded configuration with the standard evaluator.
    pub fn from_config(config: &Config, invoker: Arc<dyn ServiceInvoker>) -> Self {
        Self::new(
            Planner::from_config(config),
            PipelineExecutor::new(invoker, config.pipeline.clone()),
        )
    }

    /// Replace the condition evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.planner = self.planner.with_evaluator(evaluator);
        self
    }

    /// The route table.
    pub fn routes(&self) -> &[RouteConfig] {
        self.planner.routes()
    }

    /// The extension registry.
    pub fn registry(&self) -> &ExtensionRegistry {
        self.planner.registry()
    }

    /// Select the route and build the queue without invoking anything.
    pub fn plan(&self, request: &PipelineRequest) -> Result<PipelinePlan> {
        self.planner.plan(request)
    }

    /// Run a request through its pipeline.
    pub async fn handle(
        &self,
        request: &PipelineRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineRun> {
        let plan = self.plan(request)?;
        tracing::debug!(
            route = %plan.route,
            stages = plan.queue.len(),
            "extension queue built"
        );

        let run = self
            .executor
            .execute(&plan.route, &plan.queue, request.payload.clone(), cancel)
            .await?;

        tracing::info!(
            route = %run.route,
            status = run.outcome.status(),
            stages = run.stages.len(),
            rejected = run.outcome.is_rejected(),
            "pipeline finished"
        );
        Ok(run)
    }
}
