//! Application-wide hooks: request logging and domain-scope gates.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use goras_auth::{Authenticate, JwtManager};
use goras_core::errors::GorasError;
use goras_core::hooks::{AfterHook, BeforeHook, ErrorHook, HookContext};
use goras_core::GorasApp;

/// Rejects calls made in the manager scope. Branches, vats, and rates only
/// exist under a tenant subdomain.
pub struct RequireTenant;

#[async_trait]
impl BeforeHook for RequireTenant {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if ctx.tenant.is_manager() {
            return Err(GorasError::bad_request(
                "This service is tenant-scoped; use a tenant subdomain",
            )
            .into_anyhow());
        }
        Ok(())
    }
}

/// Rejects calls made under a tenant subdomain. Tenants themselves are
/// managed from the platform domain only.
pub struct RequireManagerDomain;

#[async_trait]
impl BeforeHook for RequireManagerDomain {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if !ctx.tenant.is_manager() {
            return Err(GorasError::forbidden(
                "Tenants are managed from the platform domain",
            )
            .into_anyhow());
        }
        Ok(())
    }
}

struct LogCall;

#[async_trait]
impl BeforeHook for LogCall {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        tracing::debug!(
            service = %ctx.service_name,
            method = %ctx.method.as_str(),
            tenant = ctx.tenant.slug().unwrap_or("@manager"),
            "service call"
        );
        Ok(())
    }
}

struct LogCompletion;

#[async_trait]
impl AfterHook for LogCompletion {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        tracing::debug!(
            service = %ctx.service_name,
            method = %ctx.method.as_str(),
            "service call completed"
        );
        Ok(())
    }
}

struct LogFailure;

#[async_trait]
impl ErrorHook for LogFailure {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let status = ctx
            .error
            .as_ref()
            .and_then(GorasError::from_anyhow)
            .map(|e| e.code())
            .unwrap_or(500);
        tracing::warn!(
            service = %ctx.service_name,
            method = %ctx.method.as_str(),
            status,
            error = ctx.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            "service call failed"
        );
        Ok(())
    }
}

/// Hooks every service gets: call logging and bearer-token resolution.
pub fn register_global(app: &GorasApp, jwt: Arc<JwtManager>) {
    app.hooks(|h| {
        h.before_all(Arc::new(LogCall));
        h.before_all(Arc::new(Authenticate::new(jwt)));
        h.after_all(Arc::new(LogCompletion));
        h.error_all(Arc::new(LogFailure));
    });
}
