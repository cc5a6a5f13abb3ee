//! Extension definitions and response routing.
//!
//! An extension is one pipeline stage backed by a network service. Its
//! [`ResponseRouting`] table maps the status code the service returns to
//! a [`Directive`] that steers the pipeline. Tables are validated while
//! deserializing: keys must be `"*"` or an HTTP status code.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Directive ────────────────────────────────────────────────────────────

/// Control decision derived from a stage's status code.
///
/// Accepts `"forward"`/`"continue"` and `"terminate_error"`/`"send_error"`.
/// More directives may be added; executors reject ones they do not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Directive {
    /// Continue with the next queued extension.
    #[serde(alias = "continue")]
    Forward,
    /// Stop the pipeline and answer with the fixed rejection response.
    #[serde(alias = "send_error")]
    TerminateError,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Forward => f.write_str("forward"),
            Directive::TerminateError => f.write_str("terminate_error"),
        }
    }
}

// ── ResponseRouting ──────────────────────────────────────────────────────

/// Wildcard key of a response routing table.
pub const WILDCARD: &str = "*";

/// Per-extension mapping from status code (or `"*"`) to [`Directive`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Directive>",
    into = "BTreeMap<String, Directive>"
)]
pub struct ResponseRouting {
    exact: BTreeMap<u16, Directive>,
    wildcard: Option<Directive>,
}

impl ResponseRouting {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact status code entry.
    pub fn on(mut self, status: u16, directive: Directive) -> Self {
        self.exact.insert(status, directive);
        self
    }

    /// Set the wildcard entry.
    pub fn otherwise(mut self, directive: Directive) -> Self {
        self.wildcard = Some(directive);
        self
    }

    /// The exact entry for `status`, if any.
    pub fn exact(&self, status: u16) -> Option<Directive> {
        self.exact.get(&status).copied()
    }

    /// The wildcard entry, if any.
    pub fn wildcard(&self) -> Option<Directive> {
        self.wildcard
    }

    /// Resolve `status`: exact entry first, then the wildcard.
    pub fn resolve(&self, status: u16) -> Option<Directive> {
        self.exact(status).or(self.wildcard)
    }

    /// Whether the table has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_none()
    }
}

impl TryFrom<BTreeMap<String, Directive>> for ResponseRouting {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Directive>) -> Result<Self, Self::Error> {
        let mut table = ResponseRouting::new();
        for (key, directive) in raw {
            let key = key.trim();
            if key == WILDCARD {
                table.wildcard = Some(directive);
                continue;
            }
            let status: u16 = key
                .parse()
                .map_err(|_| format!("invalid response routing key '{key}'"))?;
            if !(100..=599).contains(&status) {
                return Err(format!("status code {status} out of range 100..=599"));
            }
            table.exact.insert(status, directive);
        }
        Ok(table)
    }
}

impl From<ResponseRouting> for BTreeMap<String, Directive> {
    fn from(table: ResponseRouting) -> Self {
        let mut raw: BTreeMap<String, Directive> = table
            .exact
            .into_iter()
            .map(|(status, d)| (status.to_string(), d))
            .collect();
        if let Some(d) = table.wildcard {
            raw.insert(WILDCARD.to_string(), d);
        }
        raw
    }
}

// ── Service descriptor ───────────────────────────────────────────────────

/// HTTP method used to call an extension service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceMethod {
    /// `GET` (no body).
    Get,
    /// `POST` with the current payload as body.
    #[default]
    Post,
    /// `PUT` with the current payload as body.
    Put,
    /// `PATCH` with the current payload as body.
    Patch,
    /// `DELETE` (no body).
    Delete,
    /// `HEAD` (no body).
    Head,
}

impl ServiceMethod {
    /// Canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethod::Get => "GET",
            ServiceMethod::Post => "POST",
            ServiceMethod::Put => "PUT",
            ServiceMethod::Patch => "PATCH",
            ServiceMethod::Delete => "DELETE",
            ServiceMethod::Head => "HEAD",
        }
    }

    /// Whether the payload is sent as the request body for this method.
    pub fn carries_body(&self) -> bool {
        matches!(
            self,
            ServiceMethod::Post | ServiceMethod::Put | ServiceMethod::Patch
        )
    }
}

impl fmt::Display for ServiceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to call an extension's service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Absolute service URL.
    pub uri: String,

    /// HTTP method (defaults to `POST`).
    #[serde(default)]
    pub method: ServiceMethod,

    /// Static headers sent with every call.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ServiceDescriptor {
    /// Create a descriptor without static headers.
    pub fn new(uri: impl Into<String>, method: ServiceMethod) -> Self {
        Self {
            uri: uri.into(),
            method,
            headers: HashMap::new(),
        }
    }
}

// ── ExtensionConfig ──────────────────────────────────────────────────────

/// A configured extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Registry key. Filled from the map key when loaded from configuration.
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Inactive extensions are never queued.
    #[serde(default = "default_active")]
    pub active: bool,

    /// The backing service.
    pub service: ServiceDescriptor,

    /// Status code to directive mapping.
    #[serde(
        default,
        alias = "responseRouting",
        alias = "response_router",
        alias = "responseRouter"
    )]
    pub response_routing: ResponseRouting,
}

fn default_active() -> bool {
    true
}

impl ExtensionConfig {
    /// Create an active extension.
    pub fn new(name: impl Into<String>, service: ServiceDescriptor, routing: ResponseRouting) -> Self {
        Self {
            name: name.into(),
            active: true,
            service,
            response_routing: routing,
        }
    }

    /// Builder-style toggle of the `active` flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

// ── ExtensionRegistry ────────────────────────────────────────────────────

/// Read-only lookup of extensions by name.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, ExtensionConfig>,
}

impl ExtensionRegistry {
    /// Build a registry from a name-keyed map, stamping each entry's name.
    pub fn from_map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, ExtensionConfig)>,
    {
        let extensions = entries
            .into_iter()
            .map(|(name, mut ext)| {
                ext.name = name.clone();
                (name, ext)
            })
            .collect();
        Self { extensions }
    }

    /// Register an extension under its own name.
    pub fn insert(&mut self, ext: ExtensionConfig) {
        self.extensions.insert(ext.name.clone(), ext);
    }

    /// Look up an extension by name.
    pub fn get(&self, name: &str) -> Option<&ExtensionConfig> {
        self.extensions.get(name)
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Iterate over registered extensions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionConfig> {
        self.extensions.values()
    }
}
