//! Milk rates: what a tenant pays farmers and charges buyers per litre.

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

const VALIDATION_MESSAGE: &str = "Rates schema validation failed";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RateData {
    #[validate(length(min = 1, message = "milk_type is required"))]
    pub milk_type: String,

    #[validate(range(exclusive_min = 0.0, message = "buy_rate must be greater than zero"))]
    pub buy_rate: f64,

    #[validate(range(exclusive_min = 0.0, message = "sale_rate must be greater than zero"))]
    pub sale_rate: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "milk_type is required"))]
    pub milk_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0, message = "buy_rate must be greater than zero"))]
    pub buy_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0, message = "sale_rate must be greater than zero"))]
    pub sale_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<String>,
}

/// Cross-field rule: selling below the buying rate loses money on every
/// litre, so the sale rate must at least cover the buy rate. The error is
/// reported on `sale_rate`, the field the operator has to fix. Compares
/// only when both rates are in the payload.
struct SaleCoversBuy;

#[async_trait]
impl BeforeHook for SaleCoversBuy {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let Some(data) = ctx.data.as_ref() else {
            return Ok(());
        };
        let (Some(buy), Some(sale)) = (
            data.get("buy_rate").and_then(|v| v.as_f64()),
            data.get("sale_rate").and_then(|v| v.as_f64()),
        ) else {
            return Ok(());
        };

        if sale < buy {
            let mut errs = SchemaErrors::default();
            errs.push_field(
                "sale_rate",
                "sale_rate must be greater than or equal to buy_rate",
            );
            return Err(errs.into_unprocessable_anyhow(VALIDATION_MESSAGE));
        }
        Ok(())
    }
}

pub fn register(app: &GorasApp) -> Result<()> {
    app.service("rates")?.hooks(|h| {
        h.before_all(Arc::new(RequireTenant));
        h.before_all(Arc::new(RequireRole::any_known()));
        for method in [Create, Update, Patch, Remove] {
            h.before(method, Arc::new(RequireRole::new(vec![Role::TenantAdmin])));
        }
        h.before(Create, Arc::new(Validated::<RateData>::new(VALIDATION_MESSAGE)));
        h.before(Update, Arc::new(Validated::<RateData>::new(VALIDATION_MESSAGE)));
        h.before(Patch, Arc::new(Validated::<RatePatch>::new(VALIDATION_MESSAGE)));
        for method in [Create, Update, Patch] {
            h.before(method, Arc::new(SaleCoversBuy));
        }
    });
    Ok(())
}
