//! Validation as a before-hook.

use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use goras_core::errors::GorasError;
use goras_core::hooks::{BeforeHook, HookContext};

use crate::validate;

/// Validates `ctx.data` against a schema struct and writes the parsed,
/// default-filled payload back, so the store only ever sees schema-shaped
/// records. Unknown fields are dropped; missing payloads are a 400.
pub struct Validated<T> {
    message: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Validated<T> {
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> BeforeHook for Validated<T>
where
    T: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
{
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let Some(data) = ctx.data.as_ref() else {
            return Err(GorasError::bad_request("A payload is required").into_anyhow());
        };

        let parsed: T = validate(data, self.message)?;
        ctx.data = Some(serde_json::to_value(parsed)?);

        Ok(())
    }
}
