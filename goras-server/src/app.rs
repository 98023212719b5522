//! Application configuration.
//!
//! Defaults first, then `GORAS__*` environment variables on top:
//! `GORAS__HTTP__PORT=8080` sets `http.port`.

use goras_core::GorasApp;

pub const ENV_PREFIX: &str = "GORAS__";

pub fn configure() -> GorasApp {
    let app = GorasApp::new();

    app.set("http.host", "0.0.0.0");
    app.set("http.port", "3030");

    // Development default; any real deployment overrides GORAS__AUTH__SECRET.
    app.set("auth.secret", "dev-secret-change-me");
    app.set("auth.issuer", "goras");
    app.set("auth.audience", "goras-api");
    app.set("auth.expires_in_secs", "3600");
    app.set("auth.bcrypt_cost", "10");

    app.load_env(ENV_PREFIX);
    app
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_present() {
        let app = configure();
        assert_eq!(app.get("http.port").as_deref(), Some("3030"));
        assert!(app.get("auth.secret").is_some());
    }
}
