//! Condition evaluation.
//!
//! Routes and extension references carry a [`Condition`]; deciding whether
//! it holds for a request is delegated to a [`ConditionEvaluator`] so the
//! matcher and queue builder never depend on the predicate language.

use apix_types::condition::Condition;
use apix_types::request::PipelineRequest;

/// Strategy for evaluating a [`Condition`] against a request.
///
/// Implementations must be pure: the same condition and request always
/// yield the same answer, and evaluation has no side effects.
pub trait ConditionEvaluator: Send + Sync {
    /// Whether `condition` holds for `request`.
    fn evaluate(&self, condition: &Condition, request: &PipelineRequest) -> bool;
}

/// Evaluator for the built-in predicate language.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEvaluator;

impl ConditionEvaluator for StandardEvaluator {
    fn evaluate(&self, condition: &Condition, request: &PipelineRequest) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Method { methods } => methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(&request.method)),
            Condition::PathPrefix { prefix } => request.path().starts_with(prefix.as_str()),
            Condition::PathEquals { path } => request.path() == path.as_str(),
            Condition::HeaderPresent { name } => request.header(name).is_some(),
            Condition::HeaderEquals { name, value } => request.header(name) == Some(value.as_str()),
            Condition::HasPayload => request.has_payload(),
            Condition::HasFiles => request.has_files(),
            Condition::All { conditions } => conditions.iter().all(|c| self.evaluate(c, request)),
            Condition::Any { conditions } => conditions.iter().any(|c| self.evaluate(c, request)),
            Condition::Not { condition } => !self.evaluate(condition, request),
        }
    }
}
