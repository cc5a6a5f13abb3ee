//! Environment variable abstraction and native implementation.
//!
//! Config discovery reads `APIX_CONFIG` through the [`Environment`] trait
//! so tests can supply variables without mutating the process environment.

/// Platform-agnostic, read-only environment variable access.
pub trait Environment: Send + Sync {
    /// Get the value of an environment variable, or `None` if it is not set.
    fn get_var(&self, name: &str) -> Option<String>;
}

/// Native environment implementation using [`std::env`].
pub struct NativeEnvironment;

impl Environment for NativeEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
