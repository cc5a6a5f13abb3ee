//! Route and extension predicates.
//!
//! Conditions are plain data: a tagged variant deserialized from
//! configuration (`{"type": "path_prefix", "prefix": "/objects"}`).
//! Evaluating them against a request is done by a `ConditionEvaluator`
//! in `apix-core`, so alternative evaluation strategies can be injected
//! without touching the schema.

use serde::{Deserialize, Serialize};

/// A boolean predicate over the inbound request.
///
/// A missing condition in configuration means [`Condition::Always`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Always holds.
    #[default]
    Always,

    /// Never holds.
    Never,

    /// Holds when the request method is one of `methods` (case-insensitive).
    Method {
        /// Accepted methods.
        methods: Vec<String>,
    },

    /// Holds when the request path starts with `prefix`.
    PathPrefix {
        /// Required path prefix.
        prefix: String,
    },

    /// Holds when the request path equals `path` exactly.
    PathEquals {
        /// Required path.
        path: String,
    },

    /// Holds when the named header is present.
    HeaderPresent {
        /// Header name (case-insensitive).
        name: String,
    },

    /// Holds when the named header equals `value`.
    HeaderEquals {
        /// Header name (case-insensitive).
        name: String,
        /// Required header value (exact match).
        value: String,
    },

    /// Holds when the request carries a non-empty payload.
    HasPayload,

    /// Holds when the request carries at least one uploaded file.
    HasFiles,

    /// Holds when every nested condition holds. Empty holds.
    All {
        /// Nested conditions.
        #[serde(default)]
        conditions: Vec<Condition>,
    },

    /// Holds when at least one nested condition holds. Empty does not hold.
    Any {
        /// Nested conditions.
        #[serde(default)]
        conditions: Vec<Condition>,
    },

    /// Negates the nested condition.
    Not {
        /// The condition to negate.
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Whether this condition holds for every request, judged from its
    /// structure alone (e.g. `always`, an empty `all`, `not never`).
    pub fn is_unconditional(&self) -> bool {
        match self {
            Condition::Always => true,
            Condition::All { conditions } => conditions.iter().all(Condition::is_unconditional),
            Condition::Any { conditions } => conditions.iter().any(Condition::is_unconditional),
            Condition::Not { condition } => condition.is_unsatisfiable(),
            _ => false,
        }
    }

    /// Whether this condition holds for no request, judged from its
    /// structure alone (e.g. `never`, an empty `any`, `not always`).
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            Condition::Never => true,
            Condition::All { conditions } => conditions.iter().any(Condition::is_unsatisfiable),
            Condition::Any { conditions } => conditions.iter().all(Condition::is_unsatisfiable),
            Condition::Not { condition } => condition.is_unconditional(),
            _ => false,
        }
    }
}
