//! Status code to directive resolution.

use apix_types::error::ConfigError;
use apix_types::extension::{Directive, ResponseRouting};

/// Map a stage's status code to a [`Directive`].
///
/// An exact entry wins over the `"*"` wildcard. A status that neither
/// matches is a configuration error: there is no implicit default.
pub fn route_response(
    extension: &str,
    status: u16,
    table: &ResponseRouting,
) -> Result<Directive, ConfigError> {
    table
        .resolve(status)
        .ok_or_else(|| ConfigError::UnroutedStatus {
            extension: extension.to_string(),
            status,
        })
}
