use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub db_url: Option<String>,
    pub db_name: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let storage = match get("STORAGE_BACKEND")
            .unwrap_or_else(|| "mongo".to_string())
            .to_lowercase()
            .as_str()
        {
            "mongo" | "mongodb" => StorageBackend::Mongo,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(format!(
                    "Invalid STORAGE_BACKEND: {}. Must be 'mongo' or 'memory'",
                    other
                ))
            }
        };

        let jwt_ttl_hours = match get("JWT_TTL_HOURS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("JWT_TTL_HOURS must be an integer, got {}", raw))?,
            None => 24,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| format!("BIND_ADDR is not a socket address: {}", bind_addr))?;

        let config = Self {
            storage,
            db_url: get("DB_URL"),
            db_name: get("DB_NAME").unwrap_or_else(|| "ledgerline".to_string()),
            jwt_secret: get("JWT_SECRET").unwrap_or_default(),
            jwt_ttl_hours,
            bind_addr,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage == StorageBackend::Mongo && self.db_url.is_none() {
            return Err("DB_URL must be set when STORAGE_BACKEND is mongo".to_string());
        }
        if self.jwt_secret.is_empty() {
            return Err("JWT_SECRET must be set".to_string());
        }
        if self.jwt_ttl_hours <= 0 {
            return Err("JWT_TTL_HOURS must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, String> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_mongo() {
        let config = load(&[("DB_URL", "mongodb://localhost:27017"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.storage, StorageBackend::Mongo);
        assert_eq!(config.db_name, "ledgerline");
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn test_mongo_requires_db_url() {
        assert!(load(&[("JWT_SECRET", "s")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "s")]).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("STORAGE_BACKEND", "postgres"), ("JWT_SECRET", "s")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "s"), ("JWT_TTL_HOURS", "x")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "s"), ("BIND_ADDR", "nowhere")]).is_err());
    }
}
