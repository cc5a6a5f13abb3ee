//! Route selection.
//!
//! First match wins: routes are tried in declared order and evaluation
//! stops at the first route whose condition holds. There is no implicit
//! fallback route.

use apix_types::error::PipelineError;
use apix_types::request::PipelineRequest;
use apix_types::route::RouteConfig;

use crate::condition::ConditionEvaluator;

/// Selects the applicable route for a request.
pub struct RouteMatcher<'a> {
    routes: &'a [RouteConfig],
    evaluator: &'a dyn ConditionEvaluator,
}

impl<'a> RouteMatcher<'a> {
    /// Create a matcher over an ordered route table.
    pub fn new(routes: &'a [RouteConfig], evaluator: &'a dyn ConditionEvaluator) -> Self {
        Self { routes, evaluator }
    }

    /// Return the index and definition of the first route whose condition holds.
    pub fn select(
        &self,
        request: &PipelineRequest,
    ) -> Result<(usize, &'a RouteConfig), PipelineError> {
        let routes = self.routes;
        for (idx, route) in routes.iter().enumerate() {
            if self.evaluator.evaluate(&route.condition, request) {
                tracing::debug!(
                    route = %route.label(idx),
                    method = %request.method,
                    uri = %request.uri,
                    "route selected"
                );
                return Ok((idx, route));
            }
        }

        Err(PipelineError::NoRouteMatched {
            method: request.method.clone(),
            uri: request.uri.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::StandardEvaluator;
    use apix_types::condition::Condition;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Evaluator that counts calls and delegates to the standard one.
    struct CountingEvaluator {
        calls: AtomicUsize,
    }

    impl ConditionEvaluator for CountingEvaluator {
        fn evaluate(&self, condition: &Condition, request: &PipelineRequest) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StandardEvaluator.evaluate(condition, request)
        }
    }

    fn route(name: &str, condition: Condition) -> RouteConfig {
        RouteConfig::new(name, condition, vec![])
    }

    #[test]
    fn first_matching_route_wins() {
        let routes = vec![
            route("admin", Condition::PathPrefix { prefix: "/admin".into() }),
            route("posts", Condition::Method { methods: vec!["POST".into()] }),
            route("all", Condition::Always),
        ];
        let matcher = RouteMatcher::new(&routes, &StandardEvaluator);

        let (idx, r) = matcher.select(&PipelineRequest::new("POST", "/x")).unwrap();
        assert_eq!((idx, r.name.as_deref()), (1, Some("posts")));

        // Both "admin" and "posts" hold; the earlier one is chosen.
        let (idx, _) = matcher.select(&PipelineRequest::new("POST", "/admin/x")).unwrap();
        assert_eq!(idx, 0);

        let (idx, _) = matcher.select(&PipelineRequest::new("GET", "/x")).unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn evaluation_stops_after_match() {
        let routes = vec![
            route("never", Condition::Never),
            route("hit", Condition::Always),
            route("later", Condition::Always),
            route("latest", Condition::Always),
        ];
        let evaluator = CountingEvaluator {
            calls: AtomicUsize::new(0),
        };
        let matcher = RouteMatcher::new(&routes, &evaluator);
        let (idx, _) = matcher.select(&PipelineRequest::new("GET", "/")).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_match_is_an_error() {
        let routes = vec![route("never", Condition::Never)];
        let matcher = RouteMatcher::new(&routes, &StandardEvaluator);
        let err = matcher
            .select(&PipelineRequest::new("GET", "/nothing"))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NoRouteMatched { ref method, ref uri } if method == "GET" && uri == "/nothing"
        ));
    }

    #[test]
    fn empty_table_never_matches() {
        let matcher = RouteMatcher::new(&[], &StandardEvaluator);
        assert!(matcher.select(&PipelineRequest::new("GET", "/")).is_err());
    }
}
