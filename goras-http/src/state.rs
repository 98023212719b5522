use std::sync::Arc;

use goras_core::GorasApp;

/// Shared router state: the app container.
#[derive(Clone)]
pub struct HttpState {
    pub app: Arc<GorasApp>,
}

impl HttpState {
    pub fn new(app: Arc<GorasApp>) -> Self {
        Self { app }
    }
}
