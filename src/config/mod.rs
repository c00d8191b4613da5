use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub trial: TrialConfig,
    pub identity: IdentityConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for signing the session cookie payload
    pub secret: String,
    pub cookie_name: String,
    pub ttl_hours: u64,
    /// Send the cookie only over https
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    pub trial_days: i64,
    /// Window after trial expiry during which rank is not yet downgraded
    pub grace_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging =
                v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.session.ttl_hours = v.parse().unwrap_or(self.session.ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }

        // Trial overrides
        if let Ok(v) = env::var("TRIAL_DAYS") {
            self.trial.trial_days = v.parse().unwrap_or(self.trial.trial_days);
        }
        if let Ok(v) = env::var("TRIAL_GRACE_DAYS") {
            self.trial.grace_days = v.parse().unwrap_or(self.trial.grace_days);
        }

        // Identity provider overrides
        if let Ok(v) = env::var("IDENTITY_BASE_URL") {
            self.identity.base_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_REQUEST_TIMEOUT_SECS") {
            self.identity.request_timeout_secs =
                v.parse().unwrap_or(self.identity.request_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_CORS") {
            self.api.enable_cors = v.parse().unwrap_or(self.api.enable_cors);
        }
        if let Ok(v) = env::var("API_CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging =
                v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes =
                v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            session: SessionConfig {
                secret: "dev-session-secret-do-not-ship".to_string(),
                cookie_name: "fuse_session".to_string(),
                ttl_hours: 24 * 7, // 1 week
                secure_cookie: false,
            },
            trial: TrialConfig {
                trial_days: 14,
                grace_days: 3,
            },
            identity: IdentityConfig {
                base_url: "http://localhost:4100".to_string(),
                request_timeout_secs: 10,
            },
            api: ApiConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            session: SessionConfig {
                secret: String::new(), // must come from SESSION_SECRET
                cookie_name: "fuse_session".to_string(),
                ttl_hours: 24,
                secure_cookie: true,
            },
            trial: TrialConfig {
                trial_days: 14,
                grace_days: 3,
            },
            identity: IdentityConfig {
                base_url: "https://identity.staging.fuse.example.com".to_string(),
                request_timeout_secs: 10,
            },
            api: ApiConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.fuse.example.com".to_string()],
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            session: SessionConfig {
                secret: String::new(), // must come from SESSION_SECRET
                cookie_name: "fuse_session".to_string(),
                ttl_hours: 4,
                secure_cookie: true,
            },
            trial: TrialConfig {
                trial_days: 14,
                grace_days: 3,
            },
            identity: IdentityConfig {
                base_url: "https://identity.fuse.example.com".to_string(),
                request_timeout_secs: 5,
            },
            api: ApiConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.fuse.example.com".to_string()],
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_config_has_usable_session_defaults() {
        let config = AppConfig::development();
        assert!(!config.session.secret.is_empty());
        assert!(!config.session.secure_cookie);
        assert_eq!(config.session.cookie_name, "fuse_session");
    }

    #[test]
    fn production_config_requires_secret_from_env() {
        let config = AppConfig::production();
        assert!(config.session.secret.is_empty());
        assert!(config.session.secure_cookie);
    }

    #[test]
    fn trial_defaults_carry_grace_window() {
        let config = AppConfig::development();
        assert_eq!(config.trial.trial_days, 14);
        assert_eq!(config.trial.grace_days, 3);
    }
}
