//! Route definitions.
//!
//! Routes form an ordered table: the first route whose condition holds
//! is applied, and its extension list is expanded in declared order.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// A reference from a route to a registered extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRef {
    /// Registry name of the extension.
    pub name: String,

    /// Local condition; the extension is queued only when it holds.
    #[serde(default, alias = "conditions")]
    pub condition: Condition,
}

impl ExtensionRef {
    /// Reference an extension unconditionally.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: Condition::Always,
        }
    }

    /// Reference an extension under a local condition.
    pub fn when(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Optional human-readable name used in logs and errors.
    #[serde(default)]
    pub name: Option<String>,

    /// Route selection predicate.
    #[serde(default, alias = "conditions")]
    pub condition: Condition,

    /// Extensions to run, in order.
    #[serde(default)]
    pub extensions: Vec<ExtensionRef>,
}

impl RouteConfig {
    /// Create a named route.
    pub fn new(name: impl Into<String>, condition: Condition, extensions: Vec<ExtensionRef>) -> Self {
        Self {
            name: Some(name.into()),
            condition,
            extensions,
        }
    }

    /// Label for logs: the route name, or `#<index>` when unnamed.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{index}"),
        }
    }
}
