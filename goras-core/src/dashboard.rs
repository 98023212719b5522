//! Role-based dashboard dispatch.
//!
//! A flat lookup from the normalized role to a dashboard view and a fixed
//! navigation list. Unrecognized roles fall through to a "not configured"
//! placeholder rather than an error; the gate that decides whether a role
//! is allowed at all lives with the transport (401/403 before dispatch).

use serde::Serialize;

use crate::role::Role;

/// Which dashboard a user lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardView {
    ManagerOverview,
    TenantOverview,
    FarmerDeliveries,
    BranchOperations,
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub view: DashboardView,
    pub nav: Vec<NavItem>,
}

const fn nav(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

/// Dispatch a raw role string (with or without the `ROLE_` prefix).
pub fn dispatch(raw_role: &str) -> Dashboard {
    match Role::parse(raw_role) {
        Some(role) => for_role(role),
        None => Dashboard {
            view: DashboardView::NotConfigured,
            nav: vec![],
        },
    }
}

/// The fixed dashboard configuration for a known role.
pub fn for_role(role: Role) -> Dashboard {
    match role {
        Role::SuperAdmin => Dashboard {
            view: DashboardView::ManagerOverview,
            nav: vec![
                nav("Tenants", "/tenants"),
                nav("Modules", "/modules"),
                nav("Settings", "/settings"),
            ],
        },
        Role::TenantAdmin => Dashboard {
            view: DashboardView::TenantOverview,
            nav: vec![
                nav("Modules", "/modules"),
                nav("Branches", "/branches"),
                nav("Chill Vats", "/vats"),
                nav("Milk Rates", "/rates"),
                nav("Users", "/users"),
                nav("Settings", "/settings"),
            ],
        },
        Role::DairyFarmer => Dashboard {
            view: DashboardView::FarmerDeliveries,
            nav: vec![nav("My Deliveries", "/deliveries"), nav("Milk Rates", "/rates")],
        },
        Role::BranchManager => Dashboard {
            view: DashboardView::BranchOperations,
            nav: vec![
                nav("Branch", "/branches"),
                nav("Chill Vats", "/vats"),
                nav("Collections", "/collections"),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farmer_role_dispatches_farmer_dashboard() {
        let d = dispatch("ROLE_DAIRY_FARMER");
        assert_eq!(d.view, DashboardView::FarmerDeliveries);
        assert!(!d.nav.is_empty());
    }

    #[test]
    fn unrecognized_role_gets_placeholder() {
        let d = dispatch("ROLE_POTTER");
        assert_eq!(d.view, DashboardView::NotConfigured);
        assert!(d.nav.is_empty());
    }

    #[test]
    fn every_known_role_has_a_view() {
        for role in Role::ALL {
            let d = for_role(role);
            assert_ne!(d.view, DashboardView::NotConfigured);
        }
    }
}
