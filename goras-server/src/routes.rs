//! Ad-hoc routes outside the service pipeline: the dashboard dispatcher
//! and the health check.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use goras_auth::{extract_bearer_token, JwtManager};
use goras_core::dashboard;
use goras_core::errors::GorasError;
use goras_core::role::{normalize, Role};
use goras_http::rest::tenant_from_headers;
use goras_http::HttpError;

#[derive(Clone)]
struct DashboardState {
    jwt: Arc<JwtManager>,
}

pub fn dashboard_router(jwt: Arc<JwtManager>) -> Router<()> {
    Router::new()
        .route("/", get(dashboard))
        .with_state(DashboardState { jwt })
}

/// Resolve the caller's dashboard.
///
/// No token or a bad one is a 401; a token for another tenant is a 403; a
/// known role outside the allow-list is a 403. A role the platform has
/// never heard of still lands somewhere: the not-configured placeholder.
async fn dashboard(
    State(state): State<DashboardState>,
    headers: HeaderMap,
) -> Result<Json<Value>, HttpError> {
    let tenant = tenant_from_headers(&headers);

    let mut lowered = HashMap::new();
    for (k, v) in headers.iter() {
        if let Ok(s) = v.to_str() {
            lowered.insert(k.as_str().to_string(), s.to_string());
        }
    }

    let token = extract_bearer_token(&lowered)
        .ok_or_else(|| GorasError::not_authenticated("Not authenticated").into_anyhow())?;
    let claims = state
        .jwt
        .verify(&token)
        .map_err(|e| GorasError::not_authenticated(e.to_string()).into_anyhow())?;

    if claims.tenant.as_deref() != tenant.slug() {
        return Err(GorasError::forbidden("Token was not issued for this tenant")
            .into_anyhow()
            .into());
    }

    if let Some(role) = Role::parse(&claims.role) {
        if !Role::dashboard_allow_list().contains(&role) {
            return Err(GorasError::forbidden(format!(
                "Role {} is not allowed on the dashboard",
                role
            ))
            .into_anyhow()
            .into());
        }
    }

    let dashboard = dashboard::dispatch(&claims.role);
    Ok(Json(json!({
        "role": normalize(&claims.role),
        "view": dashboard.view,
        "nav": dashboard.nav,
    })))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
