//! goras-auth: JWT issue/verify, password hashing, and the hooks that
//! gate service calls (authenticate, require-auth, require-role) and keep
//! secrets out of responses (hash-password, protect).

pub mod hooks;
pub mod jwt;
pub mod password;

pub use hooks::{Authenticate, HashPassword, Protect, RequireAuth, RequireRole};
pub use jwt::{extract_bearer_token, Claims, JwtManager, JwtOptions, TokenError};
pub use password::{hash_password, verify_password};
