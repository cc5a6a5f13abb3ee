//! Configuration for the built-in extension services.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Built-in services mounted by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Property validation service.
    #[serde(default)]
    pub validation: ValidationServiceConfig,

    /// Append-only store service.
    #[serde(default)]
    pub store: StoreServiceConfig,
}

/// Settings for the validation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationServiceConfig {
    /// Mount the service under `/_services/validation`.
    #[serde(default)]
    pub enabled: bool,

    /// Rules keyed by property name.
    #[serde(default)]
    pub rules: BTreeMap<String, ValidationRule>,
}

/// Rules applied to one property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Allowed data types for every value of the property.
    #[serde(default, alias = "datatypes")]
    pub datatype: Option<Vec<DataType>>,

    /// Allowed number of values.
    #[serde(default)]
    pub cardinality: Option<Cardinality>,
}

/// JSON data types a property value may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// A JSON string.
    String,
    /// A JSON number without fractional part.
    Integer,
    /// A JSON number with fractional part.
    #[serde(alias = "float", alias = "number")]
    Double,
    /// `true` or `false`.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
    /// `null`.
    Null,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Double => "double",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::Null => "null",
        };
        f.write_str(name)
    }
}

/// Inclusive bounds on the number of values of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    /// Minimum number of values.
    #[serde(default)]
    pub min: Option<usize>,
    /// Maximum number of values.
    #[serde(default)]
    pub max: Option<usize>,
}

/// Settings for the store service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreServiceConfig {
    /// Mount the service under `/_services/store`.
    #[serde(default)]
    pub enabled: bool,

    /// Output file. Defaults to `apix_store.out` in the temp directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreServiceConfig {
    /// The configured output path, or the default one.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("apix_store.out"))
    }
}
