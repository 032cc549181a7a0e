//! Entity serialization schemas
//!
//! A [`Schema`] dumps entities into JSON and reports anything it could not
//! represent as field-keyed [`ValidationErrors`] instead of failing outright,
//! so list handlers can answer 400 with the full error payload.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::handlers::ValidationErrors;

/// Output of a dump: data plus any errors found while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Dumped {
    /// Serialized data
    pub data: Value,
    /// Errors keyed by field (or `index.field` for collections)
    pub errors: ValidationErrors,
}

impl Dumped {
    /// Data without errors
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            errors: ValidationErrors::new(),
        }
    }
}

/// Serializer for one model type
pub trait Schema<M>: Send + Sync {
    /// Name used in documentation
    fn name(&self) -> &str;

    /// Dump a single entity
    fn dump_one(&self, entity: &M) -> Dumped;

    /// Dump a collection as a JSON array, prefixing errors with the item index
    fn dump_many(&self, entities: &[M]) -> Dumped {
        let mut data = Vec::with_capacity(entities.len());
        let mut errors = ValidationErrors::new();

        for (index, entity) in entities.iter().enumerate() {
            let dumped = self.dump_one(entity);
            if !dumped.errors.is_empty() {
                errors.merge_prefixed(&index.to_string(), dumped.errors);
            }
            data.push(dumped.data);
        }

        Dumped {
            data: Value::Array(data),
            errors,
        }
    }
}

/// Serde-backed schema with field selection
///
/// # Example
///
/// ```rust
/// use acton_resources::schema::{JsonSchema, Schema};
/// use serde::Serialize;
/// use serde_json::json;
///
/// #[derive(Serialize)]
/// struct Account {
///     id: u64,
///     email: String,
///     password_hash: String,
/// }
///
/// let schema = JsonSchema::<Account>::new("AccountSchema").exclude(&["password_hash"]);
/// let dumped = schema.dump_one(&Account {
///     id: 1,
///     email: "a@example.com".to_string(),
///     password_hash: "x".to_string(),
/// });
///
/// assert_eq!(dumped.data, json!({"id": 1, "email": "a@example.com"}));
/// assert!(dumped.errors.is_empty());
/// ```
pub struct JsonSchema<M> {
    name: String,
    only: Option<Vec<String>>,
    exclude: Vec<String>,
    required: Vec<String>,
    _marker: PhantomData<fn(&M)>,
}

impl<M> Clone for JsonSchema<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            only: self.only.clone(),
            exclude: self.exclude.clone(),
            required: self.required.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Serialize> JsonSchema<M> {
    /// Dump every serialized field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            only: None,
            exclude: Vec::new(),
            required: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Dump only these fields
    #[must_use]
    pub fn only(mut self, fields: &[&str]) -> Self {
        self.only = Some(fields.iter().map(|f| (*f).to_string()).collect());
        self
    }

    /// Never dump these fields
    #[must_use]
    pub fn exclude(mut self, fields: &[&str]) -> Self {
        self.exclude.extend(fields.iter().map(|f| (*f).to_string()));
        self
    }

    /// Report an error when these fields are missing or null
    #[must_use]
    pub fn require(mut self, fields: &[&str]) -> Self {
        self.required.extend(fields.iter().map(|f| (*f).to_string()));
        self
    }

    fn selected(&self, field: &str) -> bool {
        let included = self
            .only
            .as_ref()
            .map_or(true, |only| only.iter().any(|f| f == field));
        included && !self.exclude.iter().any(|f| f == field)
    }
}

impl<M: Serialize> Schema<M> for JsonSchema<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dump_one(&self, entity: &M) -> Dumped {
        let value = match serde_json::to_value(entity) {
            Ok(value) => value,
            Err(e) => {
                return Dumped {
                    data: Value::Null,
                    errors: ValidationErrors::new().with("_schema", e.to_string()),
                }
            }
        };

        let Value::Object(fields) = value else {
            return Dumped::ok(value);
        };

        let mut errors = ValidationErrors::new();
        for field in &self.required {
            if fields.get(field).map_or(true, Value::is_null) {
                errors.add(field.as_str(), "Missing data for required field.");
            }
        }

        let data: Map<String, Value> = fields
            .into_iter()
            .filter(|(name, _)| self.selected(name))
            .collect();

        Dumped {
            data: Value::Object(data),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Widget;
    use serde_json::json;

    #[test]
    fn test_dump_one_with_only() {
        let schema = JsonSchema::<Widget>::new("WidgetSchema").only(&["name"]);
        let dumped = schema.dump_one(&Widget::named("sprocket"));
        assert_eq!(dumped, Dumped::ok(json!({"name": "sprocket"})));
    }

    #[test]
    fn test_dump_many_builds_array() {
        let schema = JsonSchema::<Widget>::new("WidgetSchema");
        let dumped = schema.dump_many(&[Widget::stored(1, "a"), Widget::stored(2, "b")]);
        assert_eq!(
            dumped.data,
            json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}])
        );
        assert!(dumped.errors.is_empty());
    }

    #[test]
    fn test_dump_many_prefixes_errors_with_index() {
        let schema = JsonSchema::<Widget>::new("WidgetSchema").require(&["id"]);
        let dumped = schema.dump_many(&[Widget::stored(1, "a"), Widget::named("unsaved")]);
        assert_eq!(
            dumped.errors.get("1.id"),
            Some(&["Missing data for required field.".to_string()][..])
        );
        assert_eq!(dumped.errors.len(), 1);
    }

    #[test]
    fn test_empty_collection() {
        let schema = JsonSchema::<Widget>::new("WidgetSchema");
        assert_eq!(schema.dump_many(&[]), Dumped::ok(json!([])));
    }
}
