//! REST routers over Goras services.
//!
//! One router per service: `GET`/`POST` on the collection, `GET`/`PUT`/
//! `PATCH`/`DELETE` on `/{id}`. The tenant context comes from the `Host`
//! header via the subdomain resolver; requests without a resolvable tenant
//! run in the manager scope.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::{header::HOST, HeaderMap, Uri},
    routing, Json, Router,
};
use serde_json::json;

use goras_core::errors::GorasError;
use goras_core::params::RequestParams;
use goras_core::service::Record;
use goras_core::tenant::TenantContext;
use goras_core::GorasApp;

use crate::{HttpError, HttpState};

fn map_json_rejection(rejection: JsonRejection) -> HttpError {
    GorasError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into_anyhow()
        .into()
}

pub fn tenant_from_headers(headers: &HeaderMap) -> TenantContext {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(TenantContext::from_host)
        .unwrap_or_else(TenantContext::manager)
}

pub fn rest_params(
    headers: &HeaderMap,
    query: HashMap<String, String>,
    method: &str,
    uri: &Uri,
) -> RequestParams {
    let mut params = RequestParams {
        provider: "rest".to_string(),
        headers: HashMap::new(),
        query,
        method: method.to_string(),
        path: uri.path().to_string(),
        user: None,
    };

    for (k, v) in headers.iter() {
        if let Ok(s) = v.to_str() {
            params.headers.insert(k.as_str().to_string(), s.to_string());
        }
    }

    params
}

pub fn service_router(service_name: Arc<String>, app: Arc<GorasApp>) -> Router<()> {
    let state = HttpState::new(app);

    Router::new()
        .route(
            "/",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<HttpState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri| async move {
                    let tenant = tenant_from_headers(&headers);
                    let params = rest_params(&headers, query, "GET", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.find(tenant, params).await?;
                    Ok::<_, HttpError>(Json(res))
                }
            })
            .post({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<HttpState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      data: Result<Json<Record>, JsonRejection>| async move {
                    let tenant = tenant_from_headers(&headers);
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let params = rest_params(&headers, query, "POST", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.create(tenant, data, params).await?;
                    Ok::<_, HttpError>(Json(res))
                }
            }),
        )
        .route(
            "/{id}",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<HttpState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>| async move {
                    let tenant = tenant_from_headers(&headers);
                    let params = rest_params(&headers, query, "GET", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.get(tenant, &id, params).await?;
                    Ok::<_, HttpError>(Json(res))
                }
            })
            .put({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<HttpState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>,
                      data: Result<Json<Record>, JsonRejection>| async move {
                    let tenant = tenant_from_headers(&headers);
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let params = rest_params(&headers, query, "PUT", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.update(tenant, &id, data, params).await?;
                    Ok::<_, HttpError>(Json(res))
                }
            })
            .patch({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<HttpState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>,
                      data: Result<Json<Record>, JsonRejection>| async move {
                    let tenant = tenant_from_headers(&headers);
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let params = rest_params(&headers, query, "PATCH", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.patch(tenant, Some(&id), data, params).await?;
                    Ok::<_, HttpError>(Json(res))
                }
            })
            .delete({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<HttpState>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>| async move {
                    let tenant = tenant_from_headers(&headers);
                    let params = rest_params(&headers, query, "DELETE", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.remove(tenant, Some(&id), params).await?;
                    Ok::<_, HttpError>(Json(res))
                }
            }),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn tenant_resolution_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("acme.localhost:3030"));
        assert_eq!(tenant_from_headers(&headers).slug(), Some("acme"));

        headers.insert(HOST, HeaderValue::from_static("www.example.com"));
        assert!(tenant_from_headers(&headers).is_manager());

        headers.remove(HOST);
        assert!(tenant_from_headers(&headers).is_manager());
    }

    #[test]
    fn rest_params_carry_lowercased_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer t"));
        let uri: Uri = "/rates?x=1".parse().unwrap();

        let params = rest_params(&headers, HashMap::new(), "GET", &uri);
        assert_eq!(params.provider, "rest");
        assert_eq!(params.path, "/rates");
        assert_eq!(params.headers.get("authorization").map(|s| s.as_str()), Some("Bearer t"));
    }
}
