//! Users and the hooks that keep credentials safe.
//!
//! Creating a user is open (it is how a deployment bootstraps its first
//! admin); everything else on the service needs an admin role. Passwords
//! are bcrypt-hashed on the way in and stripped on the way out.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use goras_auth::{HashPassword, Protect, RequireRole};
use goras_core::hooks::{BeforeHook, HookContext};
use goras_core::role::{normalize, Role};
use goras_core::service::ServiceMethodKind::{Create, Find, Get, Patch, Remove, Update};
use goras_core::GorasApp;
use goras_schema::{SchemaErrors, Validated};

use crate::services::PHONE_RE;

const VALIDATION_MESSAGE: &str = "Users schema validation failed";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UserData {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *PHONE_RE, message = "phone must be +977 followed by 10 digits"))]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "username is required"))]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *PHONE_RE, message = "phone must be +977 followed by 10 digits"))]
    pub phone: Option<String>,
}

/// Rejects roles the platform does not know and canonicalizes the ones it
/// does, so stored records and token claims always carry the normalized
/// form.
struct KnownRole;

#[async_trait]
impl BeforeHook for KnownRole {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let Some(raw) = ctx
            .data
            .as_ref()
            .and_then(|d| d.get("role"))
            .and_then(|v| v.as_str())
        else {
            return Ok(());
        };

        let Some(role) = Role::parse(raw) else {
            let mut errs = SchemaErrors::default();
            errs.push_field("role", format!("is not a known role: {}", normalize(raw)));
            return Err(errs.into_unprocessable_anyhow(VALIDATION_MESSAGE));
        };

        if let Some(map) = ctx.data.as_mut().and_then(|d| d.as_object_mut()) {
            map.insert("role".to_string(), Value::String(role.as_str().to_string()));
        }
        Ok(())
    }
}

pub fn register(app: &GorasApp) -> Result<()> {
    app.service("users")?.hooks(|h| {
        for method in [Find, Get, Update, Patch, Remove] {
            h.before(
                method,
                Arc::new(RequireRole::new(vec![Role::SuperAdmin, Role::TenantAdmin])),
            );
        }
        h.before(Create, Arc::new(Validated::<UserData>::new(VALIDATION_MESSAGE)));
        h.before(Update, Arc::new(Validated::<UserData>::new(VALIDATION_MESSAGE)));
        h.before(Patch, Arc::new(Validated::<UserPatch>::new(VALIDATION_MESSAGE)));
        for method in [Create, Update, Patch] {
            h.before(method, Arc::new(KnownRole));
            h.before(method, Arc::new(HashPassword::new("password")));
        }
        h.after_all(Arc::new(Protect::from_fields(&["password"])));
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goras_core::config::GorasConfig;
    use goras_core::errors::GorasError;
    use goras_core::params::RequestParams;
    use goras_core::service::ServiceMethodKind;
    use goras_core::tenant::TenantContext;
    use serde_json::json;

    fn ctx_with_data(data: serde_json::Value) -> HookContext {
        let mut ctx = HookContext::new(
            TenantContext::tenant("acme"),
            "users".to_string(),
            ServiceMethodKind::Create,
            RequestParams::internal(),
            GorasConfig::new().snapshot(),
        );
        ctx.data = Some(data);
        ctx
    }

    #[tokio::test]
    async fn unknown_role_is_unprocessable() {
        let mut ctx = ctx_with_data(json!({"role": "ROLE_POTTER"}));
        let err = KnownRole.run(&mut ctx).await.unwrap_err();
        let goras = GorasError::from_anyhow(&err).unwrap();
        assert_eq!(goras.code(), 422);
        assert!(goras.errors.as_ref().unwrap().get("role").is_some());
    }

    #[tokio::test]
    async fn role_is_canonicalized() {
        let mut ctx = ctx_with_data(json!({"role": "role_tenant_admin"}));
        KnownRole.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.data.unwrap()["role"], json!("TENANT_ADMIN"));
    }

    #[test]
    fn short_password_fails_schema() {
        let data = json!({"username": "ram", "password": "short", "role": "TENANT_ADMIN"});
        assert!(goras_schema::validate::<UserData>(&data, VALIDATION_MESSAGE).is_err());
    }
}
