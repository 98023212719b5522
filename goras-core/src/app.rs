//! The Goras application container.
//!
//! Holds the service registry, global and per-service hooks, and config.
//! `ServiceHandle` runs the hook pipeline around every method call, so
//! transports and internal callers get identical behavior.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;

use crate::config::{ConfigSnapshot, GorasConfig};
use crate::errors::GorasError;
use crate::hooks::{
    collect_method_hooks, AfterHook, BeforeHook, ErrorHook, HookContext, HookFut, HookResult,
    ServiceHooks,
};
use crate::params::RequestParams;
use crate::service::{GorasService, Record, ServiceMethodKind};
use crate::tenant::TenantContext;

struct GorasAppInner {
    registry: RwLock<HashMap<String, Arc<dyn GorasService>>>,
    global_hooks: RwLock<ServiceHooks>,
    service_hooks: RwLock<HashMap<String, ServiceHooks>>,
    config: RwLock<GorasConfig>,
}

/// Central application container. Cheap to clone; all clones share state.
pub struct GorasApp {
    inner: Arc<GorasAppInner>,
}

impl Default for GorasApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GorasApp {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

type ServiceCall =
    Box<dyn for<'a> FnOnce(Arc<dyn GorasService>, &'a mut HookContext) -> HookFut<'a> + Send>;

type HooksForMethod = (
    Vec<Arc<dyn BeforeHook>>,
    Vec<Arc<dyn AfterHook>>,
    Vec<Arc<dyn ErrorHook>>,
);

impl GorasApp {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GorasAppInner {
                registry: RwLock::new(HashMap::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(GorasConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn GorasService>)
    where
        S: Into<String>,
    {
        self.inner
            .registry
            .write()
            .unwrap()
            .insert(name.into(), service);
    }

    /// `app.hooks(|h| { ... })` - hooks applied to every service.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks),
    {
        let mut g = self.inner.global_hooks.write().unwrap();
        f(&mut g);
    }

    pub(crate) fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks),
    {
        let mut map = self.inner.service_hooks.write().unwrap();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    /// `app.service("vats")` - look up a registered service.
    pub fn service(&self, name: &str) -> Result<ServiceHandle> {
        let svc = self
            .inner
            .registry
            .read()
            .unwrap()
            .get(name)
            .ok_or_else(|| GorasError::not_found(format!("Service not found: {name}")).into_anyhow())?
            .clone();

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().unwrap().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let cfg = self.inner.config.read().unwrap();
        cfg.get(key).map(|v| v.to_string())
    }

    /// Layer `GORAS__*`-style environment variables onto the config.
    pub fn load_env(&self, prefix: &str) {
        self.inner.config.write().unwrap().load_env(prefix);
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.inner.config.read().unwrap().snapshot()
    }
}

/// A named service plus the app it lives in; every call goes through the
/// hook pipeline.
pub struct ServiceHandle {
    app: GorasApp,
    name: String,
    service: Arc<dyn GorasService>,
}

impl ServiceHandle {
    /// `app.service("vats")?.hooks(|h| { ... })`
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &Arc<dyn GorasService> {
        &self.service
    }

    fn collect_hooks_for_method(&self, method: ServiceMethodKind) -> HooksForMethod {
        let g = self.app.inner.global_hooks.read().unwrap();
        let map = self.app.inner.service_hooks.read().unwrap();
        let s = map.get(&self.name);

        // Global first, then service.
        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = s {
            before.extend(collect_method_hooks(
                &h.before_all,
                &h.before_by_method,
                method,
            ));
            after.extend(collect_method_hooks(
                &h.after_all,
                &h.after_by_method,
                method,
            ));
            error.extend(collect_method_hooks(
                &h.error_all,
                &h.error_by_method,
                method,
            ));
        }

        (before, after, error)
    }

    fn ensure_allowed(&self, method: ServiceMethodKind) -> Result<()> {
        if self.service.capabilities().allows(method) {
            return Ok(());
        }
        Err(GorasError::method_not_allowed(format!(
            "Method not allowed: {} on {}",
            method.as_str(),
            self.name
        ))
        .into_anyhow())
    }

    fn new_context(&self, tenant: TenantContext, method: ServiceMethodKind, params: RequestParams) -> HookContext {
        HookContext::new(
            tenant,
            self.name.clone(),
            method,
            params,
            self.app.config_snapshot(),
        )
    }

    /// before* -> service call -> after* (reverse order); error hooks on
    /// failure, which may recover by clearing `ctx.error`.
    async fn run_pipeline(&self, mut ctx: HookContext, call: ServiceCall) -> Result<HookContext> {
        let (before, after, error) = self.collect_hooks_for_method(ctx.method);
        let svc = self.service.clone();

        let res: Result<()> = {
            let ctx = &mut ctx;
            async move {
                for h in &before {
                    h.run(ctx).await?;
                }

                // sets ctx.result
                (call)(svc, ctx).await?;

                for h in after.iter().rev() {
                    h.run(ctx).await?;
                }

                Ok(())
            }
            .await
        };

        if let Err(e) = res {
            ctx.error = Some(e);

            for h in &error {
                let _ = h.run(&mut ctx).await;
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    pub async fn find(&self, tenant: TenantContext, params: RequestParams) -> Result<Vec<Record>> {
        let method = ServiceMethodKind::Find;
        self.ensure_allowed(method)?;

        let ctx = self.new_context(tenant, method, params);
        let ctx = self
            .run_pipeline(
                ctx,
                Box::new(|svc, ctx| {
                    Box::pin(async move {
                        let records = svc.find(&ctx.tenant, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::Many(records));
                        Ok(())
                    })
                }),
            )
            .await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(_)) => Err(anyhow::anyhow!(
                "find() produced HookResult::One unexpectedly"
            )),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, tenant: TenantContext, id: &str, params: RequestParams) -> Result<Record> {
        let method = ServiceMethodKind::Get;
        self.ensure_allowed(method)?;

        let ctx = self.new_context(tenant, method, params);
        let id = id.to_string();

        let ctx = self
            .run_pipeline(
                ctx,
                Box::new(move |svc, ctx| {
                    Box::pin(async move {
                        let record = svc.get(&ctx.tenant, &id, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::One(record));
                        Ok(())
                    })
                }),
            )
            .await?;

        expect_one(ctx.result, "get")
    }

    pub async fn create(
        &self,
        tenant: TenantContext,
        data: Record,
        params: RequestParams,
    ) -> Result<Record> {
        let method = ServiceMethodKind::Create;
        self.ensure_allowed(method)?;

        let mut ctx = self.new_context(tenant, method, params);
        ctx.data = Some(data);

        let ctx = self
            .run_pipeline(
                ctx,
                Box::new(|svc, ctx| {
                    Box::pin(async move {
                        let data = ctx
                            .data
                            .take()
                            .ok_or_else(|| anyhow::anyhow!("create() requires ctx.data"))?;
                        let created = svc.create(&ctx.tenant, data, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::One(created));
                        Ok(())
                    })
                }),
            )
            .await?;

        expect_one(ctx.result, "create")
    }

    pub async fn update(
        &self,
        tenant: TenantContext,
        id: &str,
        data: Record,
        params: RequestParams,
    ) -> Result<Record> {
        let method = ServiceMethodKind::Update;
        self.ensure_allowed(method)?;

        let mut ctx = self.new_context(tenant, method, params);
        ctx.data = Some(data);
        let id = id.to_string();

        let ctx = self
            .run_pipeline(
                ctx,
                Box::new(move |svc, ctx| {
                    Box::pin(async move {
                        let data = ctx
                            .data
                            .take()
                            .ok_or_else(|| anyhow::anyhow!("update() requires ctx.data"))?;
                        let updated = svc
                            .update(&ctx.tenant, &id, data, ctx.params.clone())
                            .await?;
                        ctx.result = Some(HookResult::One(updated));
                        Ok(())
                    })
                }),
            )
            .await?;

        expect_one(ctx.result, "update")
    }

    pub async fn patch(
        &self,
        tenant: TenantContext,
        id: Option<&str>,
        data: Record,
        params: RequestParams,
    ) -> Result<Record> {
        let method = ServiceMethodKind::Patch;
        self.ensure_allowed(method)?;

        let mut ctx = self.new_context(tenant, method, params);
        ctx.data = Some(data);
        let id: Option<String> = id.map(|s| s.to_string());

        let ctx = self
            .run_pipeline(
                ctx,
                Box::new(move |svc, ctx| {
                    Box::pin(async move {
                        let data = ctx
                            .data
                            .take()
                            .ok_or_else(|| anyhow::anyhow!("patch() requires ctx.data"))?;
                        let patched = svc
                            .patch(&ctx.tenant, id.as_deref(), data, ctx.params.clone())
                            .await?;
                        ctx.result = Some(HookResult::One(patched));
                        Ok(())
                    })
                }),
            )
            .await?;

        expect_one(ctx.result, "patch")
    }

    pub async fn remove(
        &self,
        tenant: TenantContext,
        id: Option<&str>,
        params: RequestParams,
    ) -> Result<Record> {
        let method = ServiceMethodKind::Remove;
        self.ensure_allowed(method)?;

        let ctx = self.new_context(tenant, method, params);
        let id: Option<String> = id.map(|s| s.to_string());

        let ctx = self
            .run_pipeline(
                ctx,
                Box::new(move |svc, ctx| {
                    Box::pin(async move {
                        let removed = svc
                            .remove(&ctx.tenant, id.as_deref(), ctx.params.clone())
                            .await?;
                        ctx.result = Some(HookResult::One(removed));
                        Ok(())
                    })
                }),
            )
            .await?;

        expect_one(ctx.result, "remove")
    }
}

fn expect_one(result: Option<HookResult>, method: &str) -> Result<Record> {
    match result {
        Some(HookResult::One(v)) => Ok(v),
        Some(HookResult::Many(_)) => Err(anyhow::anyhow!(
            "{method}() produced HookResult::Many unexpectedly"
        )),
        None => Err(anyhow::anyhow!("{method}() produced no result")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceCapabilities;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoService;

    #[async_trait]
    impl GorasService for EchoService {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
        }

        async fn create(
            &self,
            ctx: &TenantContext,
            data: Record,
            _params: RequestParams,
        ) -> Result<Record> {
            let mut out = data;
            if let Some(map) = out.as_object_mut() {
                map.insert(
                    "tenant".to_string(),
                    json!(ctx.slug().unwrap_or("manager")),
                );
            }
            Ok(out)
        }
    }

    struct StampBefore;

    #[async_trait]
    impl BeforeHook for StampBefore {
        async fn run(&self, ctx: &mut HookContext) -> Result<()> {
            if let Some(data) = ctx.data.as_mut().and_then(|d| d.as_object_mut()) {
                data.insert("stamped".to_string(), json!(true));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn pipeline_runs_before_hooks_and_service() {
        let app = GorasApp::new();
        app.register_service("echo", Arc::new(EchoService));
        app.hooks(|h| {
            h.before(ServiceMethodKind::Create, Arc::new(StampBefore));
        });

        let out = app
            .service("echo")
            .unwrap()
            .create(
                TenantContext::tenant("acme"),
                json!({"a": 1}),
                RequestParams::internal(),
            )
            .await
            .unwrap();

        assert_eq!(out["stamped"], json!(true));
        assert_eq!(out["tenant"], json!("acme"));
    }

    #[tokio::test]
    async fn disallowed_method_is_405() {
        let app = GorasApp::new();
        app.register_service("echo", Arc::new(EchoService));

        let err = app
            .service("echo")
            .unwrap()
            .find(TenantContext::manager(), RequestParams::internal())
            .await
            .unwrap_err();

        let goras = GorasError::from_anyhow(&err).expect("must be GorasError");
        assert_eq!(goras.code(), 405);
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let app = GorasApp::new();
        let err = app.service("missing").err().expect("must be an error");
        let goras = GorasError::from_anyhow(&err).expect("must be GorasError");
        assert_eq!(goras.code(), 404);
    }
}
