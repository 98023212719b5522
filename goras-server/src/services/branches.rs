//! Milk collection branches.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use validator::Validate;

use goras_auth::RequireRole;
use goras_core::role::Role;
use goras_core::service::ServiceMethodKind::{Create, Patch, Remove, Update};
use goras_core::GorasApp;
use goras_schema::Validated;

use crate::hooks::RequireTenant;
use crate::services::PHONE_RE;

const VALIDATION_MESSAGE: &str = "Branches schema validation failed";
const PHONE_MESSAGE: &str = "phone must be +977 followed by 10 digits";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BranchData {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(regex(path = *PHONE_RE, message = "phone must be +977 followed by 10 digits"))]
    pub phone: String,

    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BranchPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *PHONE_RE, message = "phone must be +977 followed by 10 digits"))]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "location is required"))]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
}

pub fn register(app: &GorasApp) -> Result<()> {
    app.service("branches")?.hooks(|h| {
        h.before_all(Arc::new(RequireTenant));
        h.before_all(Arc::new(RequireRole::any_known()));
        for method in [Create, Update, Patch, Remove] {
            h.before(method, Arc::new(RequireRole::new(vec![Role::TenantAdmin])));
        }
        h.before(Create, Arc::new(Validated::<BranchData>::new(VALIDATION_MESSAGE)));
        h.before(Update, Arc::new(Validated::<BranchData>::new(VALIDATION_MESSAGE)));
        h.before(Patch, Arc::new(Validated::<BranchPatch>::new(VALIDATION_MESSAGE)));
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goras_core::errors::GorasError;
    use serde_json::json;

    #[test]
    fn phone_without_country_code_is_rejected() {
        let data = json!({
            "name": "Central",
            "phone": "9812345678",
            "location": "Pokhara"
        });

        let err = goras_schema::validate::<BranchData>(&data, VALIDATION_MESSAGE).unwrap_err();
        let goras = GorasError::from_anyhow(&err).unwrap();
        assert_eq!(goras.code(), 422);
        assert_eq!(goras.errors.as_ref().unwrap()["phone"][0], PHONE_MESSAGE);
    }

    #[test]
    fn valid_branch_passes() {
        let data = json!({
            "name": "Central",
            "phone": "+9779812345678",
            "location": "Pokhara"
        });
        goras_schema::validate::<BranchData>(&data, VALIDATION_MESSAGE).unwrap();
    }

    #[test]
    fn patch_validates_only_provided_fields() {
        let data = json!({"name": "Central East"});
        goras_schema::validate::<BranchPatch>(&data, VALIDATION_MESSAGE).unwrap();

        let data = json!({"phone": "bogus"});
        assert!(goras_schema::validate::<BranchPatch>(&data, VALIDATION_MESSAGE).is_err());
    }
}
