//! Chill vats: refrigerated storage at a branch.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use goras_auth::RequireRole;
use goras_core::hooks::{BeforeHook, HookContext};
use goras_core::role::Role;
use goras_core::service::ServiceMethodKind::{Create, Patch, Remove, Update};
use goras_core::GorasApp;
use goras_schema::{SchemaErrors, Validated};

use crate::hooks::RequireTenant;

const VALIDATION_MESSAGE: &str = "Vats schema validation failed";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VatData {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(range(min = 1.0, message = "capacity_litres must be at least 1"))]
    pub capacity_litres: f64,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "current_stock_litres must not be negative"))]
    pub current_stock_litres: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VatPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1.0, message = "capacity_litres must be at least 1"))]
    pub capacity_litres: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "current_stock_litres must not be negative"))]
    pub current_stock_litres: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

/// Cross-field rule: a vat can never hold more than it is rated for.
/// Compares only when both fields are in the payload, so a patch touching
/// one of them passes through.
struct StockWithinCapacity;

#[async_trait]
impl BeforeHook for StockWithinCapacity {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let Some(data) = ctx.data.as_ref() else {
            return Ok(());
        };
        let (Some(capacity), Some(stock)) = (
            data.get("capacity_litres").and_then(|v| v.as_f64()),
            data.get("current_stock_litres").and_then(|v| v.as_f64()),
        ) else {
            return Ok(());
        };

        if stock > capacity {
            let mut errs = SchemaErrors::default();
            errs.push_field(
                "current_stock_litres",
                "current_stock_litres must not exceed capacity_litres",
            );
            return Err(errs.into_unprocessable_anyhow(VALIDATION_MESSAGE));
        }
        Ok(())
    }
}

pub fn register(app: &GorasApp) -> Result<()> {
    app.service("vats")?.hooks(|h| {
        h.before_all(Arc::new(RequireTenant));
        h.before_all(Arc::new(RequireRole::any_known()));
        for method in [Create, Update, Patch, Remove] {
            h.before(
                method,
                Arc::new(RequireRole::new(vec![Role::TenantAdmin, Role::BranchManager])),
            );
        }
        h.before(Create, Arc::new(Validated::<VatData>::new(VALIDATION_MESSAGE)));
        h.before(Update, Arc::new(Validated::<VatData>::new(VALIDATION_MESSAGE)));
        h.before(Patch, Arc::new(Validated::<VatPatch>::new(VALIDATION_MESSAGE)));
        for method in [Create, Update, Patch] {
            h.before(method, Arc::new(StockWithinCapacity));
        }
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
            "vats".to_string(),
            ServiceMethodKind::Create,
            RequestParams::internal(),
            GorasConfig::new().snapshot(),
        );
        ctx.data = Some(data);
        ctx
    }

    #[tokio::test]
    async fn stock_above_capacity_is_unprocessable() {
        let mut ctx = ctx_with_data(json!({
            "name": "Vat A",
            "capacity_litres": 500.0,
            "current_stock_litres": 600.0
        }));

        let err = StockWithinCapacity.run(&mut ctx).await.unwrap_err();
        let goras = GorasError::from_anyhow(&err).unwrap();
        assert_eq!(goras.code(), 422);
        assert!(goras.errors.as_ref().unwrap().get("current_stock_litres").is_some());
    }

    #[tokio::test]
    async fn stock_equal_to_capacity_passes() {
        let mut ctx = ctx_with_data(json!({
            "name": "Vat A",
            "capacity_litres": 500.0,
            "current_stock_litres": 500.0
        }));
        StockWithinCapacity.run(&mut ctx).await.unwrap();
    }

    #[tokio::test]
    async fn partial_payload_is_not_compared() {
        let mut ctx = ctx_with_data(json!({"current_stock_litres": 600.0}));
        StockWithinCapacity.run(&mut ctx).await.unwrap();
    }

    #[test]
    fn zero_capacity_fails_schema() {
        let vat: VatData =
            serde_json::from_value(json!({"name": "Vat A", "capacity_litres": 0.0})).unwrap();
        assert!(vat.validate().is_err());
    }
}
