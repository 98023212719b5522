//! Router assembly and serving.

use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use goras_core::{GorasApp, GorasService};

use crate::rest;

/// The HTTP face of a [`GorasApp`]: services mounted as REST routers plus
/// any ad-hoc handlers.
pub struct HttpApp {
    pub app: Arc<GorasApp>,
    pub router: Router<()>,
}

impl Clone for HttpApp {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            router: self.router.clone(),
        }
    }
}

impl HttpApp {
    pub fn new(app: GorasApp) -> Self {
        Self {
            app: Arc::new(app),
            router: Router::new(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Mount an ad-hoc GET handler (health checks, the dashboard).
    pub fn service<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let router = Router::new().route("/", get(handler));
        self.use_router(path, router)
    }

    /// Register a service on the app and mount its REST router.
    pub fn use_service(mut self, path: &'static str, service: Arc<dyn GorasService>) -> Self {
        let name = path.trim_start_matches('/');
        self.app.register_service(name, service);

        let service_name = Arc::new(name.to_string());
        let router = rest::service_router(Arc::clone(&service_name), Arc::clone(&self.app));

        self.router = self.router.nest(path, router);
        self
    }

    /// Wrap the assembled router with request-id and trace layers. Call
    /// after the last route is mounted; axum layers only cover routes
    /// added before them.
    pub fn finalize(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// Convenience constructor, `serve(app)` reads like the Feathers original.
pub fn serve(app: GorasApp) -> HttpApp {
    HttpApp::new(app)
}
