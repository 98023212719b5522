//! Minimal key/value configuration, `app.set()` / `app.get()` style.
//!
//! Environment overrides use the `GORAS__` prefix with `__` as the
//! separator: `GORAS__HTTP__PORT=8080` becomes `http.port`.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct GorasConfig {
    values: HashMap<String, String>,
}

impl GorasConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Layer process environment variables on top of whatever is set.
    pub fn load_env(&mut self, prefix: &str) {
        for (key, value) in std::env::vars() {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

/// An immutable copy of the config, cheap to hand to hook contexts.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse::<u32>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut cfg = GorasConfig::new();
        cfg.set("http.port", "3030");
        assert_eq!(cfg.get("http.port"), Some("3030"));
        assert!(cfg.has("http.port"));
        assert!(!cfg.has("http.host"));
    }

    #[test]
    fn snapshot_typed_getters() {
        let mut cfg = GorasConfig::new();
        cfg.set("auth.expires_in_secs", "3600");
        cfg.set("auth.insecure", "true");
        let snap = cfg.snapshot();
        assert_eq!(snap.get_u64("auth.expires_in_secs"), Some(3600));
        assert_eq!(snap.get_bool("auth.insecure"), Some(true));
        assert_eq!(snap.get_u64("missing"), None);
    }
}
