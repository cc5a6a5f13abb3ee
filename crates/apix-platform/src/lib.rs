//! Platform abstraction layer for apix.
//!
//! Provides traits for the platform-dependent operations the gateway needs
//! (outbound HTTP to extension services, filesystem, environment) so the
//! engine never touches the network or disk directly.
//!
//! # Architecture
//!
//! The [`Platform`] trait bundles all platform capabilities via accessor methods.
//! Each sub-capability has its own trait ([`http::HttpClient`], [`fs::FileSystem`],
//! [`env::Environment`]) with a corresponding native implementation.
//! [`config_loader`] builds on the filesystem and environment seams to find
//! and parse the configuration document.
//!
//! # Example
//!
//! ```rust,no_run
//! use apix_platform::{Platform, NativePlatform};
//! use apix_platform::config_loader::load_config;
//!
//! # async fn example() {
//! let platform = NativePlatform::new();
//! let config = load_config(platform.fs(), platform.env(), None)
//!     .await
//!     .unwrap();
//! println!("{} routes", config.routes.len());
//! # }
//! ```

pub mod config_loader;
pub mod env;
pub mod fs;
pub mod http;

use std::sync::Arc;

/// Bundle of all platform capabilities.
pub trait Platform: Send + Sync {
    /// Filesystem operations.
    fn fs(&self) -> &dyn fs::FileSystem;

    /// Environment variable access.
    fn env(&self) -> &dyn env::Environment;

    /// Shared HTTP client for calling extension services.
    fn shared_http(&self) -> Arc<dyn http::HttpClient>;
}

/// Native platform implementation using std, tokio, and reqwest.
///
/// This is the standard platform for the gateway and the CLI. It provides:
/// - HTTP via [`reqwest`] with connection pooling and TLS.
/// - Filesystem via [`tokio::fs`].
/// - Environment via [`std::env`].
pub struct NativePlatform {
    http: Arc<http::NativeHttpClient>,
    fs: fs::NativeFileSystem,
    env: env::NativeEnvironment,
}

impl NativePlatform {
    /// Create a new native platform with default configuration.
    pub fn new() -> Self {
        Self {
            http: Arc::new(http::NativeHttpClient::new()),
            fs: fs::NativeFileSystem,
            env: env::NativeEnvironment,
        }
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for NativePlatform {
    fn fs(&self) -> &dyn fs::FileSystem {
        &self.fs
    }

    fn env(&self) -> &dyn env::Environment {
        &self.env
    }

    fn shared_http(&self) -> Arc<dyn http::HttpClient> {
        self.http.clone()
    }
}
