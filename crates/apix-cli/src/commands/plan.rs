//! `apix plan` -- show the route and extension queue a request would get.
//!
//! Runs route selection and queue construction only; no extension
//! service is contacted.

use apix_core::Planner;
use apix_core::pipeline::PipelinePlan;
use apix_platform::NativePlatform;

use super::{RequestArgs, load_config, request_from_args};

/// Render a plan as pretty-printed JSON.
pub fn render_plan(plan: &PipelinePlan) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// Print the plan for the described request.
pub async fn run(args: RequestArgs) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, args.config.as_deref()).await?;
    let request = request_from_args(&platform, &args).await?;

    let plan = Planner::from_config(&config)
        .plan(&request)
        .map_err(|e| anyhow::anyhow!("{} {}: {e}", request.method, request.uri))?;
    println!("{}", render_plan(&plan)?);
    Ok(())
}
