//! JWT signing and verification (HS256).

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use goras_core::config::ConfigSnapshot;
use goras_core::errors::GorasError;

/// Token claims. `tenant` is the slug the token was issued under; absent
/// for manager-domain tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct JwtOptions {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expires_in_secs: u64,
}

impl JwtOptions {
    /// Read `auth.*` keys from app config. The secret is mandatory; the
    /// rest have defaults.
    pub fn from_config(cfg: &ConfigSnapshot) -> Result<Self> {
        let secret = cfg
            .get_string("auth.secret")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GorasError::general_error("auth.secret is not configured").into_anyhow()
            })?;

        Ok(Self {
            secret,
            issuer: cfg
                .get_string("auth.issuer")
                .unwrap_or_else(|| "goras".to_string()),
            audience: cfg
                .get_string("auth.audience")
                .unwrap_or_else(|| "goras-api".to_string()),
            expires_in_secs: cfg.get_u64("auth.expires_in_secs").unwrap_or(3600),
        })
    }
}

/// Signs and verifies access tokens.
pub struct JwtManager {
    options: JwtOptions,
}

impl JwtManager {
    pub fn new(options: JwtOptions) -> Self {
        Self { options }
    }

    pub fn from_config(cfg: &ConfigSnapshot) -> Result<Self> {
        Ok(Self::new(JwtOptions::from_config(cfg)?))
    }

    pub fn sign(&self, sub: &str, role: &str, tenant: Option<&str>) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            tenant: tenant.map(|s| s.to_string()),
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            iat: now,
            exp: now + self.options.expires_in_secs as i64,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.options.secret.as_bytes()),
        )
        .map_err(|e| GorasError::general_error(e.to_string()).into_anyhow())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[self.options.issuer.as_str()]);
        validation.set_audience(&[self.options.audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.options.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
    }
}

/// Pull a `Bearer` token out of a lowercased header map.
pub fn extract_bearer_token(headers: &HashMap<String, String>) -> Option<String> {
    let v = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?;
    let v = v.trim();
    let prefix = "Bearer ";
    if v.len() <= prefix.len() || !v.starts_with(prefix) {
        return None;
    }
    Some(v[prefix.len()..].trim().to_string())
}
