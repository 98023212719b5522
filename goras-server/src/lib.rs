//! Goras dairy platform server.
//!
//! Assembles the app: tenant-keyed stores, the service registry with its
//! hooks, and the HTTP surface (REST routers per service, the dashboard
//! dispatcher, and a health check).

use std::sync::Arc;

use anyhow::Result;

use goras_auth::JwtManager;
use goras_http::{serve, HttpApp};

pub mod app;
pub mod hooks;
pub mod routes;
pub mod services;
pub mod store;

use store::{AppState, StoreKind, StoreService};

/// Build the fully wired HTTP app. Callers either `listen` on it or drive
/// its router directly in tests.
pub fn build() -> Result<HttpApp> {
    let app = app::configure();
    let jwt = Arc::new(JwtManager::from_config(&app.config_snapshot())?);
    let state = Arc::new(AppState::default());

    hooks::register_global(&app, Arc::clone(&jwt));

    let http = serve(app)
        .use_service(
            "/modules",
            Arc::new(StoreService::new(Arc::clone(&state), StoreKind::Modules)),
        )
        .use_service(
            "/branches",
            Arc::new(StoreService::new(Arc::clone(&state), StoreKind::Branches)),
        )
        .use_service(
            "/vats",
            Arc::new(StoreService::new(Arc::clone(&state), StoreKind::Vats)),
        )
        .use_service(
            "/rates",
            Arc::new(StoreService::new(Arc::clone(&state), StoreKind::Rates)),
        )
        .use_service(
            "/users",
            Arc::new(
                StoreService::new(Arc::clone(&state), StoreKind::Users)
                    .with_unique_field("username"),
            ),
        )
        .use_service(
            "/tenants",
            Arc::new(
                StoreService::new(Arc::clone(&state), StoreKind::Tenants)
                    .with_unique_field("slug"),
            ),
        )
        .use_service(
            "/authentication",
            Arc::new(services::authentication::AuthenticationService::new(
                Arc::clone(&state),
                Arc::clone(&jwt),
            )),
        )
        .use_router("/dashboard", routes::dashboard_router(Arc::clone(&jwt)))
        .service("/health", routes::health);

    services::modules::register(&http.app)?;
    services::branches::register(&http.app)?;
    services::vats::register(&http.app)?;
    services::rates::register(&http.app)?;
    services::users::register(&http.app)?;
    services::tenants::register(&http.app)?;

    Ok(http.finalize())
}
