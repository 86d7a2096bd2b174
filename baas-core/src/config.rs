use baas_storage::StorageConfig;
use envconfig::Envconfig;

use crate::error::{BaasError, BaasResult};

#[derive(Debug, Clone, Envconfig)]
pub struct AppConfig {
    // Server
    #[envconfig(from = "HTTP_PORT", default = "8080")]
    pub http_port: u16,

    #[envconfig(from = "APP_ID", default = "baas")]
    pub app_id: String,

    #[envconfig(from = "SERVER_URL", default = "http://localhost:8080/v1")]
    pub server_url: String,

    #[envconfig(from = "MASTER_KEY")]
    pub master_key: Option<String>,

    #[envconfig(from = "READ_ONLY_MASTER_KEY")]
    pub read_only_master_key: Option<String>,

    // Storage
    #[envconfig(from = "STORAGE_TYPE", default = "memory")]
    pub storage_type: String,

    // Adapters
    #[envconfig(from = "PUSH_ADAPTER", default = "noop")]
    pub push_adapter: String,

    #[envconfig(from = "FILE_ADAPTER", default = "memory")]
    pub file_adapter: String,

    #[envconfig(from = "FILE_DIR", default = "files")]
    pub file_dir: String,

    // Logging
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    #[envconfig(from = "LOG_FORMAT", default = "plain")]
    pub log_format: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub app_id: String,
    pub server_url: String,
    pub master_key: Option<String>,
    pub read_only_master_key: Option<String>,
}

/// Names of the backends selected once at startup.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub push_adapter: String,
    pub file_adapter: String,
    pub file_dir: String,
    pub server_url: String,
}

impl AppConfig {
    pub fn load_from_env() -> BaasResult<Self> {
        Self::init_from_env().map_err(|e| BaasError::Config(e.to_string()))
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            port: self.http_port,
            app_id: self.app_id.clone(),
            server_url: self.server_url.trim_end_matches('/').to_string(),
            master_key: self.master_key.clone().filter(|k| !k.is_empty()),
            read_only_master_key: self
                .read_only_master_key
                .clone()
                .filter(|k| !k.is_empty()),
        }
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.storage_type.clone(),
        }
    }

    pub fn adapters(&self) -> AdapterConfig {
        AdapterConfig {
            push_adapter: self.push_adapter.clone(),
            file_adapter: self.file_adapter.clone(),
            file_dir: self.file_dir.clone(),
            server_url: self.server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.storage_type, "memory");
        assert_eq!(config.push_adapter, "noop");
        assert_eq!(config.server().master_key, None);
        assert!(!config.json_logs());
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("HTTP_PORT".to_string(), "9000".to_string()),
            ("MASTER_KEY".to_string(), "secret".to_string()),
            ("SERVER_URL".to_string(), "http://example.com/v1/".to_string()),
            ("LOG_FORMAT".to_string(), "JSON".to_string()),
        ]);
        let config = AppConfig::init_from_hashmap(&vars).unwrap();
        let server = config.server();
        assert_eq!(server.port, 9000);
        assert_eq!(server.master_key.as_deref(), Some("secret"));
        assert_eq!(server.server_url, "http://example.com/v1");
        assert!(config.json_logs());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let vars =
            HashMap::from([("HTTP_PORT".to_string(), "not-a-port".to_string())]);
        assert!(AppConfig::init_from_hashmap(&vars).is_err());
    }
}
