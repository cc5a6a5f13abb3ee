//! # apix-types
//!
//! Core type definitions for the apix extension pipeline gateway.
//!
//! This crate is the foundation of the dependency graph -- all other
//! apix crates depend on it. It contains:
//!
//! - **[`error`]** -- [`PipelineError`] and [`ConfigError`] error types
//! - **[`request`]** -- The immutable [`PipelineRequest`] and per-stage [`StageResult`]
//! - **[`condition`]** -- Tagged-variant route/extension predicates
//! - **[`extension`]** -- Extension definitions, directives and response routing tables
//! - **[`route`]** -- Ordered route definitions
//! - **[`config`]** -- Configuration schema and semantic validation

pub mod condition;
pub mod config;
pub mod error;
pub mod extension;
pub mod request;
pub mod route;

pub use error::{ConfigError, PipelineError, Result};
pub use request::{PipelineRequest, StageResult};
