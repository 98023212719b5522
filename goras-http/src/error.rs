use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use goras_core::errors::GorasError;

/// Wraps any pipeline error for axum. Structured errors keep their status
/// and client-facing fields; everything else becomes a sanitized 500.
#[derive(Debug)]
pub struct HttpError(pub anyhow::Error);

impl From<anyhow::Error> for HttpError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let Some(goras) = self.0.chain().find_map(|e| e.downcast_ref::<GorasError>()) {
            let safe = goras.sanitize_for_client();
            let status =
                StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        let goras = GorasError::general_error(self.0.to_string());
        let safe = goras.sanitize_for_client();
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
