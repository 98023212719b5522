//! Service wiring: schemas, validation hooks, and auth gates per resource.

use std::sync::LazyLock;

use regex::Regex;

pub mod authentication;
pub mod branches;
pub mod modules;
pub mod rates;
pub mod tenants;
pub mod users;
pub mod vats;

/// Nepali mobile numbers: the `+977` country code followed by exactly ten
/// digits.
pub(crate) static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+977\d{10}$").expect("phone regex"));
