//! goras-schema: turns `validator`-derived schema failures into structured
//! 422 errors with per-field message lists, the shape clients render as
//! inline form errors.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use validator::Validate;

use goras_core::errors::GorasError;

pub mod hooks;

pub use hooks::Validated;

/// Accumulates field-level validation messages.
///
/// Keys are field paths (`phone`, `profile.display_name`, `tags[0].email`);
/// values are arrays of messages. `_schema` holds payload-level problems.
#[derive(Default)]
pub struct SchemaErrors {
    map: Map<String, Value>,
}

impl SchemaErrors {
    pub fn push_schema(&mut self, msg: impl Into<String>) {
        Self::push_to(&mut self.map, "_schema", msg);
    }

    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        Self::push_to(&mut self.map, field, msg);
    }

    fn push_to(map: &mut Map<String, Value>, key: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match map.get_mut(key) {
            Some(Value::Array(arr)) => arr.push(msg),
            Some(_) | None => {
                map.insert(key.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_unprocessable_anyhow(self, message: &str) -> anyhow::Error {
        GorasError::unprocessable(message)
            .with_errors(Value::Object(self.map))
            .into_anyhow()
    }
}

pub fn unprocessable(message: &str, errors: Value) -> anyhow::Error {
    GorasError::unprocessable(message)
        .with_errors(errors)
        .into_anyhow()
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "regex" => Some("has invalid format"),
        "url" => Some("must be a valid URL"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn join_index(prefix: &str, idx: usize) -> String {
    format!("{prefix}[{idx}]")
}

fn push_validation_errors(out: &mut SchemaErrors, prefix: &str, errs: &validator::ValidationErrors) {
    for (field, kind) in errs.errors() {
        match kind {
            validator::ValidationErrorsKind::Field(field_errors) => {
                let key = join_path(prefix, field);
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(|m| m.to_string()))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push_field(&key, msg);
                }
            }
            validator::ValidationErrorsKind::Struct(struct_errs) => {
                let next = join_path(prefix, field);
                push_validation_errors(out, &next, struct_errs.as_ref());
            }
            validator::ValidationErrorsKind::List(list_errs) => {
                let base = join_path(prefix, field);
                for (idx, nested) in list_errs {
                    let next = join_index(&base, *idx);
                    push_validation_errors(out, &next, nested.as_ref());
                }
            }
        }
    }
}

fn validator_errors_to_schema_errors(errs: &validator::ValidationErrors) -> SchemaErrors {
    let mut out = SchemaErrors::default();
    push_validation_errors(&mut out, "", errs);
    out
}

/// Deserialize a JSON payload into a schema struct and validate it.
///
/// A shape mismatch reports under `_schema`; constraint failures report
/// under their field paths. `error_message` is the top-level message for
/// the 422 (`"Rates schema validation failed"` etc.).
pub fn validate<T>(data: &Value, error_message: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone())
        .map_err(|e| unprocessable(error_message, json!({"_schema": [e.to_string()]})))?;

    parsed
        .validate()
        .map_err(|e| validator_errors_to_schema_errors(&e).into_unprocessable_anyhow(error_message))?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use goras_core::errors::GorasError;
    use serde::Deserialize;
    use serde_json::json;
    use validator::Validate;

    use super::{validate, SchemaErrors};

    #[derive(Debug, Deserialize, Validate)]
    struct Branch {
        #[validate(length(min = 1, message = "name must not be empty"))]
        name: String,

        #[validate(length(equal = 14, message = "phone must be +977 followed by 10 digits"))]
        phone: String,
    }

    #[test]
    fn field_errors_carry_messages() {
        let data = json!({"name": "", "phone": "+9779812345678"});

        let err = validate::<Branch>(&data, "Branches schema validation failed").unwrap_err();
        let goras = GorasError::from_anyhow(&err).expect("must be GorasError");
        let errors = goras.errors.as_ref().unwrap();

        assert_eq!(errors["name"][0], "name must not be empty");
        assert!(errors.get("phone").is_none());
    }

    #[test]
    fn shape_mismatch_reports_under_schema_key() {
        let data = json!({"name": 42});

        let err = validate::<Branch>(&data, "Branches schema validation failed").unwrap_err();
        let goras = GorasError::from_anyhow(&err).expect("must be GorasError");
        let errors = goras.errors.as_ref().unwrap();

        assert!(errors.get("_schema").is_some());
    }

    #[test]
    fn push_field_accumulates_per_field() {
        let mut errs = SchemaErrors::default();
        errs.push_field("sale_rate", "must be >= buy_rate");
        errs.push_field("sale_rate", "second message");
        assert!(!errs.is_empty());

        let err = errs.into_unprocessable_anyhow("Rates schema validation failed");
        let goras = GorasError::from_anyhow(&err).unwrap();
        let errors = goras.errors.as_ref().unwrap();
        assert_eq!(errors["sale_rate"][0], "must be >= buy_rate");
        assert_eq!(errors["sale_rate"][1], "second message");
    }
}
