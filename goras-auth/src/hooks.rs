//! Auth-related hooks.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use goras_core::errors::GorasError;
use goras_core::hooks::{AfterHook, BeforeHook, HookContext, HookResult};
use goras_core::params::AuthenticatedUser;
use goras_core::role::Role;

use crate::jwt::{extract_bearer_token, JwtManager};
use crate::password::hash_password;

/// Resolves the bearer token on external calls and attaches the verified
/// identity to params.
///
/// A missing token passes through unauthenticated (gating is
/// [`RequireAuth`]'s job); an invalid or expired one fails with 401. A
/// token whose tenant claim does not match the request's tenant scope is
/// rejected outright.
pub struct Authenticate {
    jwt: Arc<JwtManager>,
}

impl Authenticate {
    pub fn new(jwt: Arc<JwtManager>) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl BeforeHook for Authenticate {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if !ctx.params.is_external() || ctx.params.authenticated() {
            return Ok(());
        }

        let Some(token) = extract_bearer_token(&ctx.params.headers) else {
            return Ok(());
        };

        let claims = self
            .jwt
            .verify(&token)
            .map_err(|e| GorasError::not_authenticated(e.to_string()).into_anyhow())?;

        if claims.tenant.as_deref() != ctx.tenant.slug() {
            return Err(
                GorasError::forbidden("Token was not issued for this tenant").into_anyhow(),
            );
        }

        ctx.params.user = Some(AuthenticatedUser {
            id: claims.sub,
            role: Role::parse(&claims.role),
            raw_role: claims.role,
            tenant: claims.tenant,
        });

        Ok(())
    }
}

/// Rejects unauthenticated external calls with 401.
pub struct RequireAuth;

#[async_trait]
impl BeforeHook for RequireAuth {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if ctx.params.is_external() && !ctx.params.authenticated() {
            return Err(GorasError::not_authenticated("Not authenticated").into_anyhow());
        }
        Ok(())
    }
}

/// Rejects external calls whose role is outside the allow-list with 403.
/// Implies [`RequireAuth`]: an unauthenticated call is a 401.
pub struct RequireRole {
    allowed: Vec<Role>,
}

impl RequireRole {
    pub fn new(allowed: Vec<Role>) -> Self {
        Self { allowed }
    }

    pub fn any_known() -> Self {
        Self::new(Role::ALL.to_vec())
    }
}

#[async_trait]
impl BeforeHook for RequireRole {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if !ctx.params.is_external() {
            return Ok(());
        }

        let Some(user) = ctx.params.user.as_ref() else {
            return Err(GorasError::not_authenticated("Not authenticated").into_anyhow());
        };

        match user.role {
            Some(role) if self.allowed.contains(&role) => Ok(()),
            _ => Err(GorasError::forbidden(format!(
                "Role {} is not allowed here",
                user.raw_role
            ))
            .into_anyhow()),
        }
    }
}

/// Bcrypt-hashes a payload field before it reaches the store. Skips calls
/// without a payload and payloads without the field; a non-string value is
/// a 400. Cost comes from `auth.bcrypt_cost` config.
pub struct HashPassword {
    field: String,
}

impl HashPassword {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

#[async_trait]
impl BeforeHook for HashPassword {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let Some(data) = ctx.data.as_mut() else {
            return Ok(());
        };
        let Some(map) = data.as_object_mut() else {
            return Ok(());
        };
        let Some(value) = map.get(&self.field) else {
            return Ok(());
        };

        let Some(plain) = value.as_str() else {
            return Err(GorasError::bad_request("Password must be a string").into_anyhow());
        };
        if plain.trim().is_empty() {
            return Ok(());
        }

        let cost = ctx.config.get_u32("auth.bcrypt_cost");
        let hashed = hash_password(plain, cost)?;
        map.insert(self.field.clone(), Value::String(hashed));

        Ok(())
    }
}

/// Deep-strips named fields from every result record, so hashes and other
/// secrets never leave the service.
pub struct Protect {
    fields: HashSet<String>,
}

impl Protect {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn strip(&self, v: &mut Value) {
        match v {
            Value::Object(map) => {
                for f in &self.fields {
                    map.remove(f);
                }
                for (_, child) in map.iter_mut() {
                    self.strip(child);
                }
            }
            Value::Array(items) => {
                for child in items.iter_mut() {
                    self.strip(child);
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl AfterHook for Protect {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        match ctx.result.as_mut() {
            Some(HookResult::One(v)) => self.strip(v),
            Some(HookResult::Many(vs)) => {
                for v in vs.iter_mut() {
                    self.strip(v);
                }
            }
            None => {}
        }
        Ok(())
    }
}
