use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "LexCita";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory.
/// `LEXCITA_DATA_DIR` overrides the default `~/LexCita/`.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEXCITA_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("LexCita")
}

/// Get the database file path
pub fn database_path() -> PathBuf {
    app_data_dir().join("lexcita.db")
}

/// Get the media directory (uploaded profile photos)
pub fn media_dir() -> PathBuf {
    app_data_dir().join("media")
}

/// Socket address the HTTP server binds to.
/// `LEXCITA_BIND_ADDR` overrides the default `127.0.0.1:8080`.
pub fn bind_addr() -> SocketAddr {
    std::env::var("LEXCITA_BIND_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)))
}

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
