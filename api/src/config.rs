//! Transport-layer configuration.

use std::env;

/// HTTP server settings read from the environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Bind address, e.g. "0.0.0.0:8080".
    pub address: String,
    /// SQLite file backing the record store.
    pub database_path: String,
    /// Externally visible base URL, embedded into widget snippets.
    pub public_base_url: String,
    /// Tenant the messaging webhook routes inbound texts to. Unset means
    /// the webhook acknowledges and drops.
    pub whatsapp_tenant: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            address: env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "chatlet.db".into()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into())
                .trim_end_matches('/')
                .to_string(),
            whatsapp_tenant: env::var("WHATSAPP_TENANT_ID").ok().filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        // Guard against ambient variables from the developer shell.
        unsafe {
            env::remove_var("API_ADDRESS");
            env::remove_var("DATABASE_PATH");
            env::remove_var("PUBLIC_BASE_URL");
            env::remove_var("WHATSAPP_TENANT_ID");
        }
        let cfg = ApiConfig::from_env();
        assert_eq!(cfg.address, "0.0.0.0:8080");
        assert_eq!(cfg.database_path, "chatlet.db");
        assert_eq!(cfg.public_base_url, "http://localhost:8080");
        assert!(cfg.whatsapp_tenant.is_none());
    }
}
