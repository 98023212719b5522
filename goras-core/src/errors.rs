//! Structured, Feathers-style errors.
//!
//! Every failure the API can emit maps to a kind with a status code and a
//! class name, and is carried through `anyhow::Error` so it survives the
//! hook pipeline. The transport decides how to serialize; `to_json` gives
//! the client-facing shape.

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for Goras core APIs.
pub type GorasResult<T> = std::result::Result<T, AnyError>;

/// Error classes the platform emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    MethodNotAllowed, // 405
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
    NotImplemented,   // 501
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
        }
    }

    /// Kebab-cased class name, as clients consume it.
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
        }
    }
}

/// A structured Goras error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct GorasError {
    pub kind: ErrorKind,
    pub message: String,
    /// Optional machine-readable context (e.g. the offending payload).
    pub data: Option<serde_json::Value>,
    /// Per-field validation messages, keyed by field path.
    pub errors: Option<serde_json::Value>,
    pub source: Option<AnyError>,
}

impl GorasError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: serde_json::Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through the hook pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `GorasError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&GorasError> {
        err.downcast_ref::<GorasError>()
    }

    /// Turn any error into a GorasError: lossless for GorasError,
    /// GeneralError otherwise.
    pub fn normalize(err: AnyError) -> GorasError {
        match err.downcast::<GorasError>() {
            Ok(goras) => goras,
            Err(other) => {
                GorasError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Client-safe copy: keeps kind/message/data/errors, drops the source.
    pub fn sanitize_for_client(&self) -> GorasError {
        GorasError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// The client-facing JSON payload.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
}

impl fmt::Display for GorasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for GorasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_structured_errors() {
        let err = GorasError::not_found("Vat not found: vat:1").into_anyhow();
        let norm = GorasError::normalize(err);
        assert_eq!(norm.kind, ErrorKind::NotFound);
        assert_eq!(norm.code(), 404);
    }

    #[test]
    fn normalize_wraps_plain_errors_as_500() {
        let err = anyhow::anyhow!("boom");
        let norm = GorasError::normalize(err);
        assert_eq!(norm.kind, ErrorKind::GeneralError);
        assert_eq!(norm.message, "boom");
    }

    #[test]
    fn to_json_has_feathers_shape() {
        let json = GorasError::unprocessable("Rates schema validation failed")
            .with_errors(serde_json::json!({"sale_rate": ["must be >= buy_rate"]}))
            .to_json();
        assert_eq!(json["name"], "Unprocessable");
        assert_eq!(json["code"], 422);
        assert_eq!(json["className"], "unprocessable");
        assert_eq!(json["errors"]["sale_rate"][0], "must be >= buy_rate");
    }
}
