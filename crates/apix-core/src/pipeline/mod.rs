//! Extension pipeline.
//!
//! Stages: Route Matcher -> Queue Builder -> Executor (Invoker -> Response Router)

pub mod traits;
pub mod matcher;
pub mod queue;
pub mod response_router;
pub mod executor;
pub mod invoker;

pub use executor::PipelineExecutor;
pub use invoker::HttpServiceInvoker;
pub use matcher::RouteMatcher;
pub use queue::build_queue;
pub use response_router::route_response;
pub use traits::{
    InvokeError, Phase, PipelineOutcome, PipelinePlan, PipelineRun, PipelineState,
    ResolvedExtension, ServiceInvoker, StageRecord, REJECTION_BODY, REJECTION_STATUS,
};
