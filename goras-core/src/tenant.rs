//! Tenant identity and subdomain resolution.
//!
//! A tenant is an isolated customer organization addressed by subdomain
//! (`tenanta.example.com`). The bare domain, `www`, localhost, and IP
//! literals all resolve to the manager scope, where cross-tenant
//! administration (the `/tenants` service) lives.

/// A tenant slug, as resolved from the request hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(pub String);

/// Which tenancy a request is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// The main/manager domain: no tenant subdomain present.
    Manager,
    /// A specific tenant, by slug.
    Tenant(TenantId),
}

/// Context carried with every Goras operation.
///
/// Passed into services and hooks so that all logic is explicitly
/// tenant-aware. Recomputed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub scope: TenantScope,
}

impl TenantContext {
    /// Context for the manager (no-tenant) domain.
    pub fn manager() -> Self {
        Self {
            scope: TenantScope::Manager,
        }
    }

    /// Context for a specific tenant slug.
    pub fn tenant<S: Into<String>>(slug: S) -> Self {
        Self {
            scope: TenantScope::Tenant(TenantId(slug.into())),
        }
    }

    /// Resolve a context from a `Host` header value (port stripped).
    pub fn from_host(host: &str) -> Self {
        let hostname = host.split(':').next().unwrap_or("");
        match resolve_tenant(hostname) {
            Some(slug) => Self::tenant(slug),
            None => Self::manager(),
        }
    }

    pub fn slug(&self) -> Option<&str> {
        match &self.scope {
            TenantScope::Manager => None,
            TenantScope::Tenant(id) => Some(id.0.as_str()),
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self.scope, TenantScope::Manager)
    }
}

/// Derive a tenant slug from a hostname, or `None` for the manager domain.
///
/// Rules, in priority order:
/// 1. `*.localhost` - first label is the slug, unless it is empty,
///    `localhost`, or `www`.
/// 2. `localhost`, `127.0.0.1`, and dotted-quad IPv4 literals have no tenant.
/// 3. Otherwise a hostname needs at least three labels; the first one is the
///    slug unless it is `www` or empty.
///
/// Slugs are lowercased so hostname case never splits a tenant in two.
pub fn resolve_tenant(hostname: &str) -> Option<String> {
    let host = hostname.trim().to_ascii_lowercase();

    if let Some(rest) = host.strip_suffix(".localhost") {
        let label = rest.split('.').next().unwrap_or("");
        if label.is_empty() || label == "localhost" || label == "www" {
            return None;
        }
        return Some(label.to_string());
    }

    if host == "localhost" || host == "127.0.0.1" || is_ipv4_literal(&host) {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 {
        return None;
    }

    let first = labels[0];
    if first.is_empty() || first == "www" {
        return None;
    }

    Some(first.to_string())
}

fn is_ipv4_literal(host: &str) -> bool {
    let mut labels = 0;
    for part in host.split('.') {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        labels += 1;
    }
    labels == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_subdomains_resolve_to_first_label() {
        assert_eq!(resolve_tenant("acme.localhost"), Some("acme".to_string()));
        assert_eq!(resolve_tenant("acme.dev.localhost"), Some("acme".to_string()));
    }

    #[test]
    fn reserved_localhost_labels_have_no_tenant() {
        assert_eq!(resolve_tenant("localhost"), None);
        assert_eq!(resolve_tenant("www.localhost"), None);
        assert_eq!(resolve_tenant("WWW.localhost"), None);
        assert_eq!(resolve_tenant(".localhost"), None);
        assert_eq!(resolve_tenant("localhost.localhost"), None);
    }

    #[test]
    fn ip_literals_have_no_tenant() {
        assert_eq!(resolve_tenant("127.0.0.1"), None);
        assert_eq!(resolve_tenant("10.0.0.5"), None);
        assert_eq!(resolve_tenant("192.168.1.100"), None);
    }

    #[test]
    fn bare_domains_have_no_tenant() {
        assert_eq!(resolve_tenant("example.com"), None);
        assert_eq!(resolve_tenant("example"), None);
    }

    #[test]
    fn subdomains_resolve_to_first_label() {
        assert_eq!(
            resolve_tenant("tenanta.example.com"),
            Some("tenanta".to_string())
        );
        assert_eq!(
            resolve_tenant("TenantA.example.com"),
            Some("tenanta".to_string())
        );
        assert_eq!(resolve_tenant("www.example.com"), None);
        assert_eq!(resolve_tenant("WWW.example.com"), None);
    }

    #[test]
    fn host_header_port_is_stripped() {
        let ctx = TenantContext::from_host("acme.localhost:3000");
        assert_eq!(ctx.slug(), Some("acme"));

        let ctx = TenantContext::from_host("127.0.0.1:3000");
        assert!(ctx.is_manager());
    }
}
