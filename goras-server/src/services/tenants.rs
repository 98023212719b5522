//! Tenant registry. Platform-domain only, super-admin only.

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use goras_auth::RequireRole;
use goras_core::role::Role;
use goras_core::service::ServiceMethodKind::{Create, Patch, Update};
use goras_core::GorasApp;
use goras_schema::Validated;

use crate::hooks::RequireManagerDomain;

const VALIDATION_MESSAGE: &str = "Tenants schema validation failed";

/// Slugs become subdomains, so they are restricted to what the resolver
/// will read back: lowercase alphanumerics and dashes, starting with an
/// alphanumeric.
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("slug regex"));

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TenantData {
    #[validate(
        length(min = 2, max = 32, message = "slug must be 2 to 32 characters"),
        regex(path = *SLUG_RE, message = "slug must be lowercase letters, digits, and dashes")
    )]
    pub slug: String,

    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TenantPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

pub fn register(app: &GorasApp) -> Result<()> {
    app.service("tenants")?.hooks(|h| {
        h.before_all(Arc::new(RequireManagerDomain));
        h.before_all(Arc::new(RequireRole::new(vec![Role::SuperAdmin])));
        h.before(Create, Arc::new(Validated::<TenantData>::new(VALIDATION_MESSAGE)));
        h.before(Update, Arc::new(Validated::<TenantData>::new(VALIDATION_MESSAGE)));
        h.before(Patch, Arc::new(Validated::<TenantPatch>::new(VALIDATION_MESSAGE)));
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uppercase_slug_is_rejected() {
        let data = json!({"slug": "Acme", "name": "Acme Dairy"});
        assert!(goras_schema::validate::<TenantData>(&data, VALIDATION_MESSAGE).is_err());
    }

    #[test]
    fn dashed_slug_passes() {
        let data = json!({"slug": "acme-west", "name": "Acme West"});
        goras_schema::validate::<TenantData>(&data, VALIDATION_MESSAGE).unwrap();
    }

    #[test]
    fn leading_dash_is_rejected() {
        let data = json!({"slug": "-acme", "name": "Acme"});
        assert!(goras_schema::validate::<TenantData>(&data, VALIDATION_MESSAGE).is_err());
    }
}
