//! Extension queue construction.

use apix_types::error::ConfigError;
use apix_types::extension::ExtensionRegistry;
use apix_types::request::PipelineRequest;
use apix_types::route::RouteConfig;

use super::traits::ResolvedExtension;
use crate::condition::ConditionEvaluator;

/// Expand a route's extension list into the ordered queue of runnable stages.
///
/// Entries keep their declared order. An entry is queued only when the
/// extension is active and its local condition holds. A name missing from
/// the registry fails the whole request, even when a later entry would
/// have been skipped anyway. The resulting queue may be empty.
pub fn build_queue(
    route: &RouteConfig,
    route_label: &str,
    registry: &ExtensionRegistry,
    evaluator: &dyn ConditionEvaluator,
    request: &PipelineRequest,
) -> Result<Vec<ResolvedExtension>, ConfigError> {
    let mut queue = Vec::with_capacity(route.extensions.len());

    for entry in &route.extensions {
        let ext = registry
            .get(&entry.name)
            .ok_or_else(|| ConfigError::UnknownExtension {
                route: route_label.to_string(),
                name: entry.name.clone(),
            })?;

        if !ext.active {
            tracing::debug!(route = %route_label, extension = %ext.name, "skipping inactive extension");
            continue;
        }
        if !evaluator.evaluate(&entry.condition, request) {
            tracing::debug!(route = %route_label, extension = %ext.name, "extension condition not met");
            continue;
        }

        queue.push(ResolvedExtension::from(ext));
    }

    Ok(queue)
}
