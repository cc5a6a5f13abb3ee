//! HTTP gateway and built-in extension services for apix.
//!
//! - [`api`]: the axum gateway that runs inbound requests through the
//!   pipeline and hosts the built-in services.
//! - [`validation`]: datatype and cardinality checks on property payloads.
//! - [`store`]: append-only payload store.

pub mod api;
pub mod error;
pub mod store;
pub mod validation;

pub use error::{Result, ServiceError};
