//! The modules service: which platform features a scope has switched on.
//!
//! Lives in both scopes. The manager domain holds the platform catalogue;
//! each tenant holds its own enabled set.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use validator::Validate;

use goras_auth::RequireRole;
use goras_core::role::Role;
use goras_core::service::ServiceMethodKind::{Create, Patch, Remove, Update};
use goras_core::GorasApp;
use goras_schema::Validated;

const VALIDATION_MESSAGE: &str = "Modules schema validation failed";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ModuleData {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ModulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

pub fn register(app: &GorasApp) -> Result<()> {
    app.service("modules")?.hooks(|h| {
        h.before_all(Arc::new(RequireRole::any_known()));
        for method in [Create, Update, Patch, Remove] {
            h.before(
                method,
                Arc::new(RequireRole::new(vec![Role::SuperAdmin, Role::TenantAdmin])),
            );
        }
        h.before(Create, Arc::new(Validated::<ModuleData>::new(VALIDATION_MESSAGE)));
        h.before(Update, Arc::new(Validated::<ModuleData>::new(VALIDATION_MESSAGE)));
        h.before(Patch, Arc::new(Validated::<ModulePatch>::new(VALIDATION_MESSAGE)));
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enabled_defaults_to_true() {
        let module: ModuleData = serde_json::from_value(json!({"name": "deliveries"})).unwrap();
        assert!(module.enabled);

        let value = serde_json::to_value(&module).unwrap();
        assert_eq!(value["enabled"], json!(true));
        assert!(value.get("description").is_none());
    }

    #[test]
    fn empty_name_fails_validation() {
        let module: ModuleData = serde_json::from_value(json!({"name": ""})).unwrap();
        assert!(module.validate().is_err());
    }
}
