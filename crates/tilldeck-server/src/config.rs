use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

/// Where the sales database lives and how the server is allowed to touch
/// it. Connections are opened read-only; the import pipeline owns writes.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub max_connections: usize,
    pub op_timeout: Duration,
    pub sqlite_pragma_cache_kib: i64,
    pub sqlite_pragma_mmap_bytes: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/sales.sqlite"),
            max_connections: 16,
            op_timeout: Duration::from_secs(5),
            sqlite_pragma_cache_kib: 8 * 1024,
            sqlite_pragma_mmap_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Error responses carry the underlying failure message only in dev
    /// mode; production callers get a generic message.
    pub dev_mode: bool,
    pub response_cache_capacity: usize,
    pub response_cache_ttl: Duration,
    pub enable_response_compression: bool,
    pub compression_min_bytes: usize,
    pub default_sample_limit: u64,
    pub max_sample_limit: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            response_cache_capacity: 50,
            response_cache_ttl: Duration::from_secs(300),
            enable_response_compression: true,
            compression_min_bytes: 4096,
            default_sample_limit: 10,
            max_sample_limit: 100,
        }
    }
}

pub fn validate_startup_config(api: &ApiConfig, store: &StoreConfig) -> Result<(), String> {
    if store.db_path.as_os_str().is_empty() {
        return Err("store db path must not be empty".to_string());
    }
    if store.max_connections == 0 {
        return Err("store connection limit must be > 0".to_string());
    }
    if store.op_timeout.is_zero() {
        return Err("store operation timeout must be > 0".to_string());
    }
    if api.response_cache_capacity == 0 || api.response_cache_ttl.is_zero() {
        return Err("response cache capacity and ttl must be > 0".to_string());
    }
    if api.max_sample_limit == 0 || api.default_sample_limit > api.max_sample_limit {
        return Err("sample limits must satisfy 0 < default <= max".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_the_startup_contract() {
        validate_startup_config(&ApiConfig::default(), &StoreConfig::default())
            .expect("default config");
    }

    #[test]
    fn startup_validation_rejects_zeroed_limits() {
        let store = StoreConfig {
            max_connections: 0,
            ..StoreConfig::default()
        };
        let err = validate_startup_config(&ApiConfig::default(), &store).expect_err("zero pool");
        assert!(err.contains("connection limit"));

        let api = ApiConfig {
            default_sample_limit: 500,
            ..ApiConfig::default()
        };
        let err =
            validate_startup_config(&api, &StoreConfig::default()).expect_err("sample bounds");
        assert!(err.contains("sample limits"));
    }
}
