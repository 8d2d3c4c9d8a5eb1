use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub backend: DatabaseBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: u64,
}

const DEVELOPMENT_JWT_SECRET: &str = "lead-tracker-development-secret";

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Preset chosen by `APP_ENV`, then individual variables from `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn set<T: std::str::FromStr>(target: &mut T, raw: Option<String>) {
            if let Some(v) = raw.and_then(|v| v.trim().parse().ok()) {
                *target = v;
            }
        }

        // Server
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        set(&mut self.server.port, lookup("PORT"));

        // Filter
        set(&mut self.filter.debug_logging, lookup("FILTER_DEBUG_LOGGING"));

        // Database
        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(v);
            self.database.backend = DatabaseBackend::Postgres;
        }
        match lookup("DATABASE_BACKEND").as_deref().map(str::trim) {
            Some("postgres") | Some("pg") => self.database.backend = DatabaseBackend::Postgres,
            Some("memory") => self.database.backend = DatabaseBackend::Memory,
            _ => {}
        }
        set(&mut self.database.max_connections, lookup("DATABASE_MAX_CONNECTIONS"));
        set(&mut self.database.connection_timeout, lookup("DATABASE_CONNECTION_TIMEOUT"));
        set(&mut self.database.enable_slow_query_warning, lookup("DATABASE_ENABLE_SLOW_QUERY_WARNING"));
        set(&mut self.database.slow_query_threshold_ms, lookup("DATABASE_SLOW_QUERY_THRESHOLD_MS"));

        // API
        set(&mut self.api.enable_rate_limiting, lookup("API_ENABLE_RATE_LIMITING"));
        set(&mut self.api.rate_limit_requests, lookup("API_RATE_LIMIT_REQUESTS"));
        set(&mut self.api.rate_limit_window_secs, lookup("API_RATE_LIMIT_WINDOW_SECS"));
        set(&mut self.api.enable_request_logging, lookup("API_ENABLE_REQUEST_LOGGING"));
        set(&mut self.api.max_request_size_bytes, lookup("API_MAX_REQUEST_SIZE_BYTES"));

        // Security
        set(&mut self.security.enable_cors, lookup("SECURITY_ENABLE_CORS"));
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS").or_else(|| lookup("ALLOWED_ORIGINS")) {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        set(&mut self.security.secure_cookies, lookup("SECURITY_SECURE_COOKIES"));
        if let Some(v) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = Some(v);
        }
        set(&mut self.security.jwt_expiry_hours, lookup("SECURITY_JWT_EXPIRY_HOURS"));

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "127.0.0.1".to_string(), port: 5000 },
            filter: FilterConfig { debug_logging: true },
            database: DatabaseConfig {
                url: None,
                backend: DatabaseBackend::Memory,
                max_connections: 10,
                connection_timeout: 30,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 15 * 60,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                secure_cookies: false,
                jwt_secret: Some(DEVELOPMENT_JWT_SECRET.to_string()),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 5000 },
            filter: FilterConfig { debug_logging: false },
            database: DatabaseConfig {
                url: None,
                backend: DatabaseBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 15 * 60,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                secure_cookies: true,
                jwt_secret: None,
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 5000 },
            filter: FilterConfig { debug_logging: false },
            database: DatabaseConfig {
                url: None,
                backend: DatabaseBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                secure_cookies: true,
                jwt_secret: None,
                jwt_expiry_hours: 24 * 7,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with_vars(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_development_config() {
        let config = with_vars(&[]);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert!(config.security.jwt_secret.is_some());
        assert!(!config.security.secure_cookies);
        assert!(config.filter.debug_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = with_vars(&[("APP_ENV", "production")]);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert!(config.security.jwt_secret.is_none());
        assert!(config.security.secure_cookies);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn database_url_selects_postgres_unless_overridden() {
        let config = with_vars(&[("DATABASE_URL", "postgres://localhost/leads")]);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/leads"));

        let config = with_vars(&[("DATABASE_URL", "postgres://localhost/leads"), ("DATABASE_BACKEND", "memory")]);
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
    }

    #[test]
    fn overrides_are_applied_and_bad_values_ignored() {
        let config = with_vars(&[
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("JWT_SECRET", "s3cret"),
        ]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.security.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.security.jwt_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn rate_limit_presets_and_overrides() {
        let config = with_vars(&[]);
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_requests, 1000);
        assert_eq!(config.api.rate_limit_window_secs, 900);

        let config = with_vars(&[("APP_ENV", "production")]);
        assert_eq!(config.api.rate_limit_requests, 100);

        let config = with_vars(&[
            ("API_ENABLE_RATE_LIMITING", "false"),
            ("API_RATE_LIMIT_REQUESTS", "5"),
            ("API_RATE_LIMIT_WINDOW_SECS", "60"),
        ]);
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_requests, 5);
        assert_eq!(config.api.rate_limit_window_secs, 60);
    }

    #[test]
    fn cors_origins_prefers_security_variable() {
        let config = with_vars(&[("SECURITY_CORS_ORIGINS", "http://x.test"), ("ALLOWED_ORIGINS", "http://y.test")]);
        assert_eq!(config.security.cors_origins, vec!["http://x.test"]);
    }
}
