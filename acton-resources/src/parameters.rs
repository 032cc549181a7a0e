//! Request parameter validators
//!
//! A [`ParameterValidator`] turns raw request input (query string values or a
//! JSON body object) into validated arguments, or into field-keyed
//! [`ValidationErrors`] that become a 400 response.
//!
//! Two validators ship with the crate:
//!
//! - [`PaginationParameters`]: `offset` and `limit` with defaults and bounds
//! - [`SerdeParameters`]: any `Deserialize` type, with an optional extra check
//!
//! # Example
//!
//! ```rust
//! use acton_resources::parameters::{PaginationParameters, ParameterValidator};
//! use serde_json::{json, Map};
//!
//! let pagination = PaginationParameters::new().with_default_limit(10);
//! let mut raw = Map::new();
//! raw.insert("offset".to_string(), json!("20"));
//!
//! let args = pagination.validate(&raw).unwrap();
//! assert_eq!(args, json!({"offset": 20, "limit": 10}));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::PaginationConfig;
use crate::handlers::ValidationErrors;
use crate::repository::Pagination;

/// Default number of items per page
pub const DEFAULT_LIMIT: u64 = 20;

/// Upper bound for `limit`
pub const MAX_LIMIT: u64 = 100;

/// Where a validator reads its raw input from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Query string
    Query,
    /// JSON request body
    Json,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Documentation entry for one accepted parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterField {
    /// Parameter name
    pub name: String,
    /// Type name (`integer`, `string`, ...)
    pub kind: String,
    /// Whether the parameter must be supplied
    pub required: bool,
    /// Value used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterField {
    /// Optional parameter of the given type
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            required: false,
            default: None,
            description: None,
        }
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Validates raw request input into handler arguments
pub trait ParameterValidator: Send + Sync {
    /// Name used in documentation and error messages
    fn name(&self) -> &str;

    /// Accepted parameters, for documentation
    fn fields(&self) -> Vec<ParameterField>;

    /// Validate raw input
    fn validate(&self, raw: &Map<String, Value>) -> Result<Value, ValidationErrors>;
}

/// Whether `validator` documents both `offset` and `limit`
pub fn produces_pagination(validator: &dyn ParameterValidator) -> bool {
    let fields = validator.fields();
    ["offset", "limit"]
        .iter()
        .all(|wanted| fields.iter().any(|field| field.name == *wanted))
}

/// `offset` / `limit` validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParameters {
    default_limit: u64,
    max_limit: u64,
}

impl Default for PaginationParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationParameters {
    /// Defaults: limit 20, at most 100
    pub fn new() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &PaginationConfig) -> Self {
        Self::new()
            .with_max_limit(config.max_limit)
            .with_default_limit(config.default_limit)
    }

    /// Limit applied when the request gives none, capped at the maximum
    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit.clamp(1, self.max_limit);
        self
    }

    /// Largest accepted limit
    #[must_use]
    pub fn with_max_limit(mut self, max: u64) -> Self {
        self.max_limit = max.max(1);
        self.default_limit = self.default_limit.min(self.max_limit);
        self
    }

    /// Default limit
    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    /// Maximum limit
    pub fn max_limit(&self) -> u64 {
        self.max_limit
    }

    /// Validate into a typed window
    pub fn parse(&self, raw: &Map<String, Value>) -> Result<Pagination, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let offset = match read_integer(raw.get("offset")) {
            Ok(None) => 0,
            Ok(Some(n)) if n >= 0 => n.unsigned_abs(),
            Ok(Some(_)) => {
                errors.add("offset", "Must be greater than or equal to 0.");
                0
            }
            Err(message) => {
                errors.add("offset", message);
                0
            }
        };

        let limit = match read_integer(raw.get("limit")) {
            Ok(None) => self.default_limit,
            Ok(Some(n)) if n >= 1 && n.unsigned_abs() <= self.max_limit => n.unsigned_abs(),
            Ok(Some(_)) => {
                errors.add("limit", format!("Must be between 1 and {}.", self.max_limit));
                self.default_limit
            }
            Err(message) => {
                errors.add("limit", message);
                self.default_limit
            }
        };

        if errors.is_empty() {
            Ok(Pagination::new(offset, limit))
        } else {
            Err(errors)
        }
    }
}

impl ParameterValidator for PaginationParameters {
    fn name(&self) -> &str {
        "PaginationParameters"
    }

    fn fields(&self) -> Vec<ParameterField> {
        vec![
            ParameterField::new("offset", "integer")
                .with_default(json!(0))
                .with_description("Number of items to skip"),
            ParameterField::new("limit", "integer")
                .with_default(json!(self.default_limit))
                .with_description(format!(
                    "Maximum number of items to return (1-{})",
                    self.max_limit
                )),
        ]
    }

    fn validate(&self, raw: &Map<String, Value>) -> Result<Value, ValidationErrors> {
        let pagination = self.parse(raw)?;
        Ok(json!({
            "offset": pagination.offset,
            "limit": pagination.limit,
        }))
    }
}

fn read_integer(value: Option<&Value>) -> Result<Option<i64>, &'static str> {
    const NOT_AN_INTEGER: &str = "Not a valid integer.";
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or(NOT_AN_INTEGER),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| NOT_AN_INTEGER),
        Some(_) => Err(NOT_AN_INTEGER),
    }
}

type Check<P> = Arc<dyn Fn(&P) -> Result<(), ValidationErrors> + Send + Sync>;

/// Validator backed by a `Deserialize` type
///
/// Deserialization failures are reported under the `_schema` key.
///
/// ```rust
/// use acton_resources::parameters::{ParameterField, ParameterValidator, SerdeParameters};
/// use acton_resources::handlers::ValidationErrors;
/// use serde::{Deserialize, Serialize};
/// use serde_json::{json, Map};
///
/// #[derive(Serialize, Deserialize)]
/// struct CreateTeam {
///     title: String,
/// }
///
/// let params = SerdeParameters::<CreateTeam>::new("CreateTeamParameters")
///     .field(ParameterField::new("title", "string").required())
///     .check(|team: &CreateTeam| {
///         if team.title.is_empty() {
///             Err(ValidationErrors::new().with("title", "Must not be empty."))
///         } else {
///             Ok(())
///         }
///     });
///
/// let mut raw = Map::new();
/// raw.insert("title".to_string(), json!(""));
/// assert!(params.validate(&raw).is_err());
/// ```
pub struct SerdeParameters<P> {
    name: String,
    fields: Vec<ParameterField>,
    check: Option<Check<P>>,
    _marker: PhantomData<fn() -> P>,
}

impl<P> SerdeParameters<P>
where
    P: DeserializeOwned + Serialize + 'static,
{
    /// Create a validator named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            check: None,
            _marker: PhantomData,
        }
    }

    /// Document an accepted field
    #[must_use]
    pub fn field(mut self, field: ParameterField) -> Self {
        self.fields.push(field);
        self
    }

    /// Run an extra check after deserialization succeeds
    #[must_use]
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&P) -> Result<(), ValidationErrors> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }
}

impl<P> ParameterValidator for SerdeParameters<P>
where
    P: DeserializeOwned + Serialize + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Vec<ParameterField> {
        self.fields.clone()
    }

    fn validate(&self, raw: &Map<String, Value>) -> Result<Value, ValidationErrors> {
        let parsed: P = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|e| ValidationErrors::new().with("_schema", e.to_string()))?;

        if let Some(check) = &self.check {
            check(&parsed)?;
        }

        serde_json::to_value(&parsed)
            .map_err(|e| ValidationErrors::new().with("_schema", e.to_string()))
    }
}
