//! In-memory tenant-keyed storage.
//!
//! Each resource lives on its own shelf: a map from scope key (the tenant
//! slug, or `@manager` for the platform domain) to records by id. Ids are
//! `<prefix>:<uuid>` and are always generated server-side.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use goras_core::errors::GorasError;
use goras_core::params::RequestParams;
use goras_core::service::{GorasService, Record};
use goras_core::tenant::TenantContext;

const MANAGER_SCOPE: &str = "@manager";

type Shelf = RwLock<HashMap<String, HashMap<String, Record>>>;

/// Every collection the server knows about. One shelf per collection so
/// unrelated resources never contend on a lock.
#[derive(Default)]
pub struct AppState {
    modules: Shelf,
    branches: Shelf,
    vats: Shelf,
    rates: Shelf,
    users: Shelf,
    tenants: Shelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Modules,
    Branches,
    Vats,
    Rates,
    Users,
    Tenants,
}

impl StoreKind {
    fn shelf<'a>(&self, state: &'a AppState) -> &'a Shelf {
        match self {
            StoreKind::Modules => &state.modules,
            StoreKind::Branches => &state.branches,
            StoreKind::Vats => &state.vats,
            StoreKind::Rates => &state.rates,
            StoreKind::Users => &state.users,
            StoreKind::Tenants => &state.tenants,
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            StoreKind::Modules => "module",
            StoreKind::Branches => "branch",
            StoreKind::Vats => "vat",
            StoreKind::Rates => "rate",
            StoreKind::Users => "user",
            StoreKind::Tenants => "tenant",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            StoreKind::Modules => "Module",
            StoreKind::Branches => "Branch",
            StoreKind::Vats => "Chill vat",
            StoreKind::Rates => "Milk rate",
            StoreKind::Users => "User",
            StoreKind::Tenants => "Tenant",
        }
    }
}

fn scope_key(ctx: &TenantContext) -> String {
    ctx.slug().unwrap_or(MANAGER_SCOPE).to_string()
}

/// CRUD over one shelf, scoped to the calling tenant. Records from one
/// scope are invisible to every other scope.
pub struct CrudAdapter {
    state: Arc<AppState>,
    kind: StoreKind,
}

impl CrudAdapter {
    pub fn new(state: Arc<AppState>, kind: StoreKind) -> Self {
        Self { state, kind }
    }

    fn not_found(&self, id: &str) -> anyhow::Error {
        GorasError::not_found(format!("{} not found: {id}", self.kind.label())).into_anyhow()
    }

    pub fn find(&self, ctx: &TenantContext) -> Vec<Record> {
        let shelf = self.kind.shelf(&self.state).read().unwrap();
        let mut out: Vec<Record> = shelf
            .get(&scope_key(ctx))
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default();
        // Stable output order for clients and tests.
        out.sort_by(|a, b| {
            let a = a["id"].as_str().unwrap_or_default();
            let b = b["id"].as_str().unwrap_or_default();
            a.cmp(b)
        });
        out
    }

    pub fn find_where<F>(&self, ctx: &TenantContext, pred: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        self.find(ctx).into_iter().filter(|r| pred(r)).collect()
    }

    pub fn get(&self, ctx: &TenantContext, id: &str) -> Result<Record> {
        let shelf = self.kind.shelf(&self.state).read().unwrap();
        shelf
            .get(&scope_key(ctx))
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    /// Insert a record under a fresh `<prefix>:<uuid>` id.
    pub fn insert(&self, ctx: &TenantContext, data: Record) -> Result<Record> {
        let mut record = into_object(data)?;
        let id = format!("{}:{}", self.kind.id_prefix(), Uuid::new_v4());
        record.insert("id".to_string(), Value::String(id.clone()));

        let record = Value::Object(record);
        let mut shelf = self.kind.shelf(&self.state).write().unwrap();
        shelf
            .entry(scope_key(ctx))
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    /// Replace an existing record wholesale; the id is preserved.
    pub fn replace(&self, ctx: &TenantContext, id: &str, data: Record) -> Result<Record> {
        let mut record = into_object(data)?;
        record.insert("id".to_string(), Value::String(id.to_string()));
        let record = Value::Object(record);

        let mut shelf = self.kind.shelf(&self.state).write().unwrap();
        let records = shelf
            .get_mut(&scope_key(ctx))
            .ok_or_else(|| self.not_found(id))?;
        let slot = records.get_mut(id).ok_or_else(|| self.not_found(id))?;
        *slot = record.clone();
        Ok(record)
    }

    /// Shallow-merge the provided fields into an existing record.
    pub fn merge(&self, ctx: &TenantContext, id: &str, data: Record) -> Result<Record> {
        let patch = into_object(data)?;

        let mut shelf = self.kind.shelf(&self.state).write().unwrap();
        let records = shelf
            .get_mut(&scope_key(ctx))
            .ok_or_else(|| self.not_found(id))?;
        let slot = records.get_mut(id).ok_or_else(|| self.not_found(id))?;

        if let Some(map) = slot.as_object_mut() {
            for (k, v) in patch {
                if k == "id" {
                    continue;
                }
                map.insert(k, v);
            }
        }
        Ok(slot.clone())
    }

    pub fn delete(&self, ctx: &TenantContext, id: &str) -> Result<Record> {
        let mut shelf = self.kind.shelf(&self.state).write().unwrap();
        shelf
            .get_mut(&scope_key(ctx))
            .and_then(|records| records.remove(id))
            .ok_or_else(|| self.not_found(id))
    }
}

fn into_object(data: Record) -> Result<serde_json::Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(GorasError::bad_request("Payload must be a JSON object").into_anyhow()),
    }
}

fn require_id(id: Option<&str>) -> Result<&str> {
    id.ok_or_else(|| GorasError::bad_request("A record id is required").into_anyhow())
}

/// A [`GorasService`] backed by one shelf. Optionally enforces uniqueness
/// of a field on create (usernames, tenant slugs).
pub struct StoreService {
    adapter: CrudAdapter,
    unique_field: Option<&'static str>,
}

impl StoreService {
    pub fn new(state: Arc<AppState>, kind: StoreKind) -> Self {
        Self {
            adapter: CrudAdapter::new(state, kind),
            unique_field: None,
        }
    }

    pub fn with_unique_field(mut self, field: &'static str) -> Self {
        self.unique_field = Some(field);
        self
    }

    /// `exclude_id` lets update/patch keep (or restate) a record's own
    /// value without tripping over itself.
    fn ensure_unique(
        &self,
        ctx: &TenantContext,
        data: &Record,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let Some(field) = self.unique_field else {
            return Ok(());
        };
        let Some(value) = data.get(field).and_then(|v| v.as_str()) else {
            return Ok(());
        };

        let taken = !self
            .adapter
            .find_where(ctx, |r| {
                r[field].as_str() == Some(value) && r["id"].as_str() != exclude_id
            })
            .is_empty();
        if taken {
            return Err(GorasError::conflict(format!(
                "A record with that {field} already exists: {value}"
            ))
            .into_anyhow());
        }
        Ok(())
    }
}

#[async_trait]
impl GorasService for StoreService {
    async fn find(&self, ctx: &TenantContext, _params: RequestParams) -> Result<Vec<Record>> {
        Ok(self.adapter.find(ctx))
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: RequestParams) -> Result<Record> {
        self.adapter.get(ctx, id)
    }

    async fn create(
        &self,
        ctx: &TenantContext,
        data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        self.ensure_unique(ctx, &data, None)?;
        self.adapter.insert(ctx, data)
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: &str,
        data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        self.ensure_unique(ctx, &data, Some(id))?;
        self.adapter.replace(ctx, id, data)
    }

    async fn patch(
        &self,
        ctx: &TenantContext,
        id: Option<&str>,
        data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        let id = require_id(id)?;
        self.ensure_unique(ctx, &data, Some(id))?;
        self.adapter.merge(ctx, id, data)
    }

    async fn remove(
        &self,
        ctx: &TenantContext,
        id: Option<&str>,
        _params: RequestParams,
    ) -> Result<Record> {
        let id = require_id(id)?;
        self.adapter.delete(ctx, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> CrudAdapter {
        CrudAdapter::new(Arc::new(AppState::default()), StoreKind::Branches)
    }

    #[test]
    fn records_are_scoped_per_tenant() {
        let state = Arc::new(AppState::default());
        let adapter = CrudAdapter::new(Arc::clone(&state), StoreKind::Modules);

        let acme = TenantContext::tenant("acme");
        let other = TenantContext::tenant("bhairav");

        adapter.insert(&acme, json!({"name": "deliveries"})).unwrap();

        assert_eq!(adapter.find(&acme).len(), 1);
        assert!(adapter.find(&other).is_empty());
        assert!(adapter.find(&TenantContext::manager()).is_empty());
    }

    #[test]
    fn insert_generates_prefixed_ids() {
        let adapter = adapter();
        let ctx = TenantContext::tenant("acme");

        let created = adapter.insert(&ctx, json!({"name": "Central"})).unwrap();
        let id = created["id"].as_str().unwrap();
        assert!(id.starts_with("branch:"));

        let fetched = adapter.get(&ctx, id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn merge_keeps_unmentioned_fields_and_id() {
        let adapter = adapter();
        let ctx = TenantContext::tenant("acme");

        let created = adapter
            .insert(&ctx, json!({"name": "Central", "phone": "+9779812345678"}))
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let patched = adapter
            .merge(&ctx, &id, json!({"name": "Central East", "id": "branch:forged"}))
            .unwrap();
        assert_eq!(patched["name"], "Central East");
        assert_eq!(patched["phone"], "+9779812345678");
        assert_eq!(patched["id"].as_str(), Some(id.as_str()));
    }

    #[test]
    fn missing_records_are_404() {
        let adapter = adapter();
        let ctx = TenantContext::tenant("acme");

        let err = adapter.get(&ctx, "branch:nope").unwrap_err();
        let goras = GorasError::from_anyhow(&err).unwrap();
        assert_eq!(goras.code(), 404);

        let err = adapter.delete(&ctx, "branch:nope").unwrap_err();
        assert_eq!(GorasError::from_anyhow(&err).unwrap().code(), 404);
    }

    #[tokio::test]
    async fn unique_field_is_enforced_on_create() {
        let service = StoreService::new(Arc::new(AppState::default()), StoreKind::Users)
            .with_unique_field("username");
        let ctx = TenantContext::tenant("acme");

        service
            .create(&ctx, json!({"username": "ram"}), RequestParams::internal())
            .await
            .unwrap();
        let err = service
            .create(&ctx, json!({"username": "ram"}), RequestParams::internal())
            .await
            .unwrap_err();
        assert_eq!(GorasError::from_anyhow(&err).unwrap().code(), 409);
    }

    #[tokio::test]
    async fn unique_field_is_enforced_on_update_and_patch() {
        let service = StoreService::new(Arc::new(AppState::default()), StoreKind::Users)
            .with_unique_field("username");
        let ctx = TenantContext::tenant("acme");

        let ram = service
            .create(&ctx, json!({"username": "ram"}), RequestParams::internal())
            .await
            .unwrap();
        let sita = service
            .create(&ctx, json!({"username": "sita"}), RequestParams::internal())
            .await
            .unwrap();
        let sita_id = sita["id"].as_str().unwrap();

        // Renaming onto a taken username conflicts, on both verbs.
        let err = service
            .patch(&ctx, Some(sita_id), json!({"username": "ram"}), RequestParams::internal())
            .await
            .unwrap_err();
        assert_eq!(GorasError::from_anyhow(&err).unwrap().code(), 409);

        let err = service
            .update(&ctx, sita_id, json!({"username": "ram"}), RequestParams::internal())
            .await
            .unwrap_err();
        assert_eq!(GorasError::from_anyhow(&err).unwrap().code(), 409);

        // A record may restate its own value.
        let ram_id = ram["id"].as_str().unwrap();
        service
            .patch(&ctx, Some(ram_id), json!({"username": "ram"}), RequestParams::internal())
            .await
            .unwrap();
    }
}
