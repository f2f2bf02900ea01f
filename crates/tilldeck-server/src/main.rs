#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tilldeck_server::{
    build_router, validate_startup_config, ApiConfig, AppState, SalesStore, StoreConfig,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("TILLDECK_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("TILLDECK_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let store_cfg = StoreConfig {
        db_path: PathBuf::from(
            env::var("TILLDECK_DB").unwrap_or_else(|_| "data/sales.sqlite".to_string()),
        ),
        max_connections: env_usize("TILLDECK_MAX_CONNECTIONS", 16),
        op_timeout: env_duration_ms("TILLDECK_STORE_OP_TIMEOUT_MS", 5000),
        sqlite_pragma_cache_kib: env_u64("TILLDECK_SQLITE_CACHE_KIB", 8 * 1024) as i64,
        sqlite_pragma_mmap_bytes: env_u64("TILLDECK_SQLITE_MMAP_BYTES", 64 * 1024 * 1024) as i64,
    };
    let api_cfg = ApiConfig {
        dev_mode: env_bool("TILLDECK_DEV_MODE", false),
        response_cache_capacity: env_usize("TILLDECK_RESPONSE_CACHE_CAPACITY", 50),
        response_cache_ttl: env_duration_ms("TILLDECK_RESPONSE_CACHE_TTL_MS", 300_000),
        enable_response_compression: env_bool("TILLDECK_ENABLE_RESPONSE_COMPRESSION", true),
        compression_min_bytes: env_usize("TILLDECK_COMPRESSION_MIN_BYTES", 4096),
        default_sample_limit: env_u64("TILLDECK_DEFAULT_SAMPLE_LIMIT", 10),
        max_sample_limit: env_u64("TILLDECK_MAX_SAMPLE_LIMIT", 100),
    };
    validate_startup_config(&api_cfg, &store_cfg)?;
    if !store_cfg.db_path.exists() {
        warn!(
            db_path = %store_cfg.db_path.display(),
            "sales database not found at startup; requests will fail until it appears"
        );
    }

    let store = SalesStore::new(store_cfg);
    let state = AppState::with_config(store, api_cfg);
    let app = build_router(state);

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("tilldeck-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
