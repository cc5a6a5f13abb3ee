//! Request and stage result types.
//!
//! A [`PipelineRequest`] is built once by whatever transport received the
//! request and is then passed by reference through route selection,
//! queue construction and every stage. It is never mutated; the evolving
//! payload lives in the executor's own state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An uploaded file attached to the inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    /// Form field name the file was submitted under.
    pub field: String,

    /// Client-supplied file name, if any.
    #[serde(default)]
    pub filename: Option<String>,

    /// Declared content type, if any.
    #[serde(default)]
    pub content_type: Option<String>,

    /// File contents.
    #[serde(default)]
    pub data: Vec<u8>,
}

/// The inbound request entering the pipeline.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// HTTP method, upper-cased (e.g. `"POST"`).
    pub method: String,

    /// Request URI as received (path plus optional query).
    pub uri: String,

    /// Request headers keyed by lower-cased name.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Raw request body. Empty when the request carried none.
    #[serde(default)]
    pub payload: Vec<u8>,

    /// Uploaded files, if any.
    #[serde(default)]
    pub files: Vec<FileUpload>,
}

impl PipelineRequest {
    /// Create a request with no headers, payload or files.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Add a header (the name is lower-cased).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the request payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Attach an uploaded file.
    pub fn with_file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    /// The URI path without its query string.
    pub fn path(&self) -> &str {
        match self.uri.find('?') {
            Some(idx) => &self.uri[..idx],
            None => &self.uri,
        }
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the request carries a non-empty payload.
    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Whether the request carries at least one uploaded file.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}

/// What a single stage's service returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Response body; empty means "no transformation".
    pub body: Vec<u8>,

    /// HTTP status code returned by the service.
    pub status: u16,
}

impl StageResult {
    /// Create a result with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }

    /// Create a result with an empty body.
    pub fn empty(status: u16) -> Self {
        Self {
            body: Vec::new(),
            status,
        }
    }

    /// Whether the stage returned a body that replaces the payload.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}
