//! Hook pipeline types.
//!
//! Hooks run in Feathers order: global before, service before, the service
//! method, service after, global after (after hooks in reverse registration
//! order); error hooks observe failures. Validation, auth gating, password
//! hashing, and field stripping are all hooks.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

use crate::config::ConfigSnapshot;
use crate::params::RequestParams;
use crate::service::{Record, ServiceMethodKind};
use crate::tenant::TenantContext;

pub type HookFut<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// What a service call produced.
#[derive(Debug)]
pub enum HookResult {
    One(Record),
    Many(Vec<Record>),
}

/// Context threaded through the pipeline for one service call.
pub struct HookContext {
    pub tenant: TenantContext,
    pub service_name: String,
    pub method: ServiceMethodKind,
    pub params: RequestParams,
    /// Input payload for create/update/patch; hooks may rewrite it.
    pub data: Option<Record>,
    /// Output; set by the service call, rewritable by after hooks.
    pub result: Option<HookResult>,
    /// Set when the pipeline failed; error hooks may clear it to recover.
    pub error: Option<anyhow::Error>,
    pub config: ConfigSnapshot,
}

impl HookContext {
    pub fn new(
        tenant: TenantContext,
        service_name: String,
        method: ServiceMethodKind,
        params: RequestParams,
        config: ConfigSnapshot,
    ) -> Self {
        Self {
            tenant,
            service_name,
            method,
            params,
            data: None,
            result: None,
            error: None,
            config,
        }
    }
}

#[async_trait::async_trait]
pub trait BeforeHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

#[async_trait::async_trait]
pub trait AfterHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ErrorHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

/// Hook registrations for one scope (the app, or a single service).
#[derive(Default)]
pub struct ServiceHooks {
    pub(crate) before_all: Vec<Arc<dyn BeforeHook>>,
    pub(crate) before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook>>>,
    pub(crate) after_all: Vec<Arc<dyn AfterHook>>,
    pub(crate) after_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AfterHook>>>,
    pub(crate) error_all: Vec<Arc<dyn ErrorHook>>,
    pub(crate) error_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn ErrorHook>>>,
}

impl ServiceHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_all(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn ErrorHook>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: Arc<dyn ErrorHook>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }
}

/// Hooks registered for all methods, then the method-specific ones.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out: Vec<Arc<H>> = all.to_vec();
    if let Some(extra) = by_method.get(&method) {
        out.extend(extra.iter().cloned());
    }
    out
}
