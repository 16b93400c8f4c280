use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Static shared secret expected in the `myschool-signature` header.
    pub api_key: String,
    /// Symmetric secret for JWT signing and verification.
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Staleness window for the cached permission snapshot.
    pub permission_cache_ttl_secs: u64,
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
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        if let Ok(v) = env::var("API_KEY") {
            self.security.api_key = v;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("PERMISSION_CACHE_TTL_SECS") {
            self.security.permission_cache_ttl_secs =
                v.parse().unwrap_or(self.security.permission_cache_ttl_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
            },
            security: SecurityConfig {
                api_key: "dev-api-key".to_string(),
                jwt_secret: "dev-jwt-secret".to_string(),
                jwt_expiry_hours: 1,
                permission_cache_ttl_secs: 3600,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
            },
            security: SecurityConfig {
                // Must come from API_KEY / JWT_SECRET in the environment
                api_key: String::new(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 1,
                permission_cache_ttl_secs: 3600,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
            },
            security: SecurityConfig {
                api_key: String::new(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 1,
                permission_cache_ttl_secs: 3600,
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
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_expiry_hours, 1);
        assert_eq!(config.security.permission_cache_ttl_secs, 3600);
        assert!(!config.security.api_key.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        // Production secrets are never baked in
        assert!(config.security.api_key.is_empty());
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 1);
    }
}
