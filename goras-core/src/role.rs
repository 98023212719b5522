//! User roles.
//!
//! Roles arrive from the outside world as strings, sometimes with a
//! `ROLE_` prefix (the convention of the upstream identity layer). They
//! are normalized once at the boundary and carried as this enum after.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of roles the platform knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Operates the manager domain: tenants, module catalogue.
    SuperAdmin,
    /// Administers a single tenant.
    TenantAdmin,
    /// Delivers milk to a collection branch.
    DairyFarmer,
    /// Runs a milk collection branch.
    BranchManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::TenantAdmin,
        Role::DairyFarmer,
        Role::BranchManager,
    ];

    /// Parse a role string, tolerating a `ROLE_` prefix and any casing.
    ///
    /// `"ROLE_DAIRY_FARMER"`, `"dairy_farmer"`, and `"DAIRY_FARMER"` all
    /// parse to [`Role::DairyFarmer`]. Unknown strings parse to `None`.
    pub fn parse(raw: &str) -> Option<Role> {
        let normalized = normalize(raw);
        match normalized.as_str() {
            "SUPER_ADMIN" => Some(Role::SuperAdmin),
            "TENANT_ADMIN" => Some(Role::TenantAdmin),
            "DAIRY_FARMER" => Some(Role::DairyFarmer),
            "BRANCH_MANAGER" => Some(Role::BranchManager),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::TenantAdmin => "TENANT_ADMIN",
            Role::DairyFarmer => "DAIRY_FARMER",
            Role::BranchManager => "BRANCH_MANAGER",
        }
    }

    /// Roles allowed through the dashboard gate. Everything known today,
    /// but kept separate so a future role can be staged before it gets a
    /// dashboard.
    pub fn dashboard_allow_list() -> &'static [Role] {
        &Self::ALL
    }
}

/// Strip a `ROLE_` prefix (case-insensitive) and uppercase the rest.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    // Bytewise prefix check: slicing at 5 would panic on a multibyte
    // character straddling the boundary.
    let rest = match trimmed.as_bytes().get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case(b"ROLE_") => &trimmed[5..],
        _ => trimmed,
    };
    rest.to_ascii_uppercase()
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_stripped() {
        assert_eq!(Role::parse("ROLE_DAIRY_FARMER"), Some(Role::DairyFarmer));
        assert_eq!(normalize("ROLE_DAIRY_FARMER"), "DAIRY_FARMER");
    }

    #[test]
    fn casing_is_tolerated() {
        assert_eq!(Role::parse("role_tenant_admin"), Some(Role::TenantAdmin));
        assert_eq!(Role::parse("super_admin"), Some(Role::SuperAdmin));
    }

    #[test]
    fn unknown_roles_do_not_parse() {
        assert_eq!(Role::parse("ROLE_POTTER"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn multibyte_role_strings_do_not_panic() {
        assert_eq!(Role::parse("ABCD\u{20ac}"), None);
        assert_eq!(Role::parse("\u{20ac}"), None);
        assert_eq!(normalize("ABCD\u{20ac}"), "ABCD\u{20ac}");
        assert_eq!(Role::parse("ROLE_\u{20ac}"), None);
    }
}
