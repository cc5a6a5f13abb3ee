//! Configuration schema for the apix gateway.
//!
//! A single document holds everything: the ordered route table, the
//! extension registry, pipeline timing settings, the gateway listener and
//! the built-in services. All field names are `snake_case` and accept a
//! `camelCase` alias. Unknown fields are ignored for forward compatibility.
//!
//! Structural problems (bad routing keys, unknown directives or methods)
//! are rejected while deserializing. Semantic problems are reported by
//! [`Config::validate`].

pub mod services;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extension::{ExtensionConfig, ExtensionRegistry};
use crate::route::RouteConfig;

pub use services::{
    Cardinality, DataType, ServicesConfig, StoreServiceConfig, ValidationRule,
    ValidationServiceConfig,
};

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inbound listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Pipeline timing and defaults.
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Ordered route table; the first matching route wins.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Extension definitions keyed by name.
    #[serde(default)]
    pub extensions: BTreeMap<String, ExtensionConfig>,

    /// Built-in extension services.
    #[serde(default)]
    pub services: ServicesConfig,
}

impl Config {
    /// Build the read-only extension registry.
    pub fn registry(&self) -> ExtensionRegistry {
        ExtensionRegistry::from_map(self.extensions.clone())
    }

    /// Check the configuration for semantic problems.
    ///
    /// Returns every issue found; an empty list means the document is
    /// consistent. Error-severity issues will make some requests fail.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.routes.is_empty() {
            issues.push(ConfigIssue::warning(
                "route table is empty; every request fails with no_route_matched",
            ));
        }

        let mut referenced = std::collections::HashSet::new();
        let mut catch_all: Option<String> = None;
        for (idx, route) in self.routes.iter().enumerate() {
            let label = route.label(idx);
            if let Some(ref earlier) = catch_all {
                issues.push(ConfigIssue::warning(format!(
                    "route '{label}' is unreachable: route '{earlier}' always matches"
                )));
            }
            if route.condition.is_unsatisfiable() {
                issues.push(ConfigIssue::warning(format!(
                    "route '{label}' can never match"
                )));
            }
            if route.condition.is_unconditional() && catch_all.is_none() {
                catch_all = Some(label.clone());
            }
            for ext_ref in &route.extensions {
                referenced.insert(ext_ref.name.as_str());
                if !self.extensions.contains_key(&ext_ref.name) {
                    issues.push(ConfigIssue::error(format!(
                        "route '{label}' references unknown extension '{}'",
                        ext_ref.name
                    )));
                }
            }
        }
        if !self.routes.is_empty() && catch_all.is_none() {
            issues.push(ConfigIssue::warning(
                "no unconditional route; unmatched requests fail with no_route_matched",
            ));
        }

        for (name, ext) in &self.extensions {
            let uri = ext.service.uri.as_str();
            if !(uri.starts_with("http://") || uri.starts_with("https://")) {
                issues.push(ConfigIssue::error(format!(
                    "extension '{name}' has non-http service uri '{uri}'"
                )));
            }
            if ext.response_routing.is_empty() {
                issues.push(ConfigIssue::error(format!(
                    "extension '{name}' has an empty response routing table"
                )));
            }
            if !referenced.contains(name.as_str()) {
                issues.push(ConfigIssue::warning(format!(
                    "extension '{name}' is not referenced by any route"
                )));
            }
        }

        if !(100..=599).contains(&self.pipeline.empty_queue_status) {
            issues.push(ConfigIssue::error(format!(
                "pipeline.empty_queue_status {} is not a valid HTTP status",
                self.pipeline.empty_queue_status
            )));
        }

        issues
    }
}

// ── GatewayConfig ────────────────────────────────────────────────────────

/// Inbound HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes", alias = "maxBodyBytes")]
    pub max_body_bytes: usize,

    /// Allowed CORS origins. Empty means permissive.
    #[serde(default, alias = "corsOrigins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

// ── PipelineSettings ─────────────────────────────────────────────────────

/// Pipeline timing and defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Per-stage timeout in milliseconds. `null` or `0` disables it; use
    /// `0` in TOML, which has no null.
    #[serde(default = "default_stage_timeout_ms", alias = "stageTimeoutMs")]
    pub stage_timeout_ms: Option<u64>,

    /// Overall pipeline deadline in milliseconds. Absent means none.
    #[serde(default, alias = "deadlineMs")]
    pub deadline_ms: Option<u64>,

    /// Status returned when the queue is empty and no stage ran.
    #[serde(default = "default_empty_queue_status", alias = "emptyQueueStatus")]
    pub empty_queue_status: u16,
}

fn default_stage_timeout_ms() -> Option<u64> {
    Some(30_000)
}

fn default_empty_queue_status() -> u16 {
    200
}

impl PipelineSettings {
    /// Effective per-stage timeout, `None` when disabled.
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_timeout_ms: default_stage_timeout_ms(),
            deadline_ms: None,
            empty_queue_status: default_empty_queue_status(),
        }
    }
}

// ── ConfigIssue ──────────────────────────────────────────────────────────

/// How serious a [`ConfigIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Some requests will fail because of it.
    Error,
    /// Suspicious but workable.
    Warning,
}

/// A problem found by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    /// Issue severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Whether this issue is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{tag}: {}", self.message)
    }
}
