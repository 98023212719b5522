//! goras-core: framework-agnostic core for the Goras dairy platform.
//!
//! Holds everything the transports build on: tenant resolution, the role
//! model, the service trait, the hook pipeline, and the app container.

pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod hooks;
pub mod params;
pub mod role;
pub mod service;
pub mod tenant;

pub use app::{GorasApp, ServiceHandle};
pub use config::{ConfigSnapshot, GorasConfig};
pub use dashboard::{dispatch, Dashboard, DashboardView, NavItem};
pub use errors::{ErrorKind, GorasError, GorasResult};
pub use hooks::{AfterHook, BeforeHook, ErrorHook, HookContext, HookResult, ServiceHooks};
pub use params::{AuthenticatedUser, RequestParams};
pub use role::Role;
pub use service::{GorasService, Record, ServiceCapabilities, ServiceMethodKind};
pub use tenant::{resolve_tenant, TenantContext, TenantId, TenantScope};
