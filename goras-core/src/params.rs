//! Request parameters carried alongside every service call.

use std::collections::HashMap;

use crate::role::Role;

/// The identity attached to a request after the authenticate hook ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User record id (`sub` claim).
    pub id: String,
    /// The raw role string from the token, before normalization.
    pub raw_role: String,
    /// The parsed role, if the raw string is one we know.
    pub role: Option<Role>,
    /// Tenant slug the token was issued for; `None` on the manager domain.
    pub tenant: Option<String>,
}

/// Concrete params for every Goras service call.
///
/// `provider` is `"rest"` for external calls and empty for internal
/// (service-to-service) calls, which skip authentication.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub provider: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
    pub user: Option<AuthenticatedUser>,
}

impl RequestParams {
    /// Params for an internal call: no provider, no headers, no user.
    pub fn internal() -> Self {
        Self::default()
    }

    pub fn is_external(&self) -> bool {
        !self.provider.trim().is_empty()
    }

    pub fn authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Case-insensitive header lookup (headers are stored lowercased by
    /// the REST layer, but internal callers may not bother).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| self.headers.get(&name.to_ascii_lowercase()))
            .map(|s| s.as_str())
    }
}
