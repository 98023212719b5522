//! The login service: `POST /authentication` with a username and password
//! returns an access token scoped to the calling domain.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use goras_auth::{verify_password, JwtManager};
use goras_core::errors::GorasError;
use goras_core::params::RequestParams;
use goras_core::service::{GorasService, Record, ServiceCapabilities, ServiceMethodKind};
use goras_core::tenant::TenantContext;

use crate::store::{AppState, CrudAdapter, StoreKind};

const VALIDATION_MESSAGE: &str = "Authentication schema validation failed";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

pub struct AuthenticationService {
    users: CrudAdapter,
    jwt: Arc<JwtManager>,
}

impl AuthenticationService {
    pub fn new(state: Arc<AppState>, jwt: Arc<JwtManager>) -> Self {
        Self {
            users: CrudAdapter::new(state, StoreKind::Users),
            jwt,
        }
    }
}

fn invalid_login() -> anyhow::Error {
    // One message for unknown user and wrong password, so the endpoint
    // does not leak which usernames exist.
    GorasError::not_authenticated("Invalid login credentials").into_anyhow()
}

#[async_trait]
impl GorasService for AuthenticationService {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(
        &self,
        ctx: &TenantContext,
        data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        let creds: Credentials = goras_schema::validate(&data, VALIDATION_MESSAGE)?;

        // Straight off the shelf, not through the users pipeline: the
        // protect hook would have stripped the stored hash.
        let user = self
            .users
            .find_where(ctx, |r| r["username"].as_str() == Some(creds.username.as_str()))
            .into_iter()
            .next()
            .ok_or_else(invalid_login)?;

        let hash = user["password"].as_str().ok_or_else(invalid_login)?;
        if !verify_password(&creds.password, hash)? {
            return Err(invalid_login());
        }

        let id = user["id"].as_str().unwrap_or_default();
        let role = user["role"].as_str().unwrap_or_default();
        let token = self.jwt.sign(id, role, ctx.slug())?;

        let mut safe = user.clone();
        if let Some(map) = safe.as_object_mut() {
            map.remove("password");
        }

        Ok(json!({"accessToken": token, "user": safe}))
    }
}
