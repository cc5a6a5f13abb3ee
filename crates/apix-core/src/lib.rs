//! # apix-core
//!
//! Core engine for the apix gateway.
//!
//! Selects a route for each inbound request, expands it into an ordered
//! queue of extension stages and runs them one after another, letting each
//! stage's status code decide whether the pipeline continues or rejects
//! the request. Configuration is read-only and shared; every request gets
//! its own pipeline state.

pub mod condition;
pub mod engine;
pub mod pipeline;

pub use engine::{Orchestrator, Planner};
