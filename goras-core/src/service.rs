//! The Goras service trait.
//!
//! Feathers-style: `find`, `get`, `create`, `update`, `patch`, `remove`.
//! Records are JSON values; every method takes the tenant context and the
//! request params. Defaults return NotImplemented so a service overrides
//! only what it supports.

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::GorasError;
use crate::params::RequestParams;
use crate::tenant::TenantContext;

/// A service record. Everything on the wire is JSON.
pub type Record = serde_json::Value;

/// Standard service methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Which methods a service exposes. The dispatch layer rejects anything
/// outside this list with a 405 before the pipeline runs.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    /// Full CRUD.
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

fn not_implemented(method: &str) -> anyhow::Error {
    GorasError::not_implemented(format!("Method not implemented: {method}")).into_anyhow()
}

/// Core Goras service trait.
#[async_trait]
pub trait GorasService: Send + Sync {
    /// Which methods this service wants callable from the outside world.
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    /// Find many records.
    async fn find(&self, _ctx: &TenantContext, _params: RequestParams) -> Result<Vec<Record>> {
        Err(not_implemented("find"))
    }

    /// Get a single record by id.
    async fn get(&self, _ctx: &TenantContext, _id: &str, _params: RequestParams) -> Result<Record> {
        Err(not_implemented("get"))
    }

    /// Create a new record.
    async fn create(
        &self,
        _ctx: &TenantContext,
        _data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        Err(not_implemented("create"))
    }

    /// Fully replace an existing record.
    async fn update(
        &self,
        _ctx: &TenantContext,
        _id: &str,
        _data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        Err(not_implemented("update"))
    }

    /// Partially update an existing record. `id` may be `None` where an
    /// implementation supports multi semantics.
    async fn patch(
        &self,
        _ctx: &TenantContext,
        _id: Option<&str>,
        _data: Record,
        _params: RequestParams,
    ) -> Result<Record> {
        Err(not_implemented("patch"))
    }

    /// Remove an existing record.
    async fn remove(
        &self,
        _ctx: &TenantContext,
        _id: Option<&str>,
        _params: RequestParams,
    ) -> Result<Record> {
        Err(not_implemented("remove"))
    }
}
