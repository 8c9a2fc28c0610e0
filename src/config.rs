use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server_name: String,
    pub listen_address: String,
    pub listen_port: u16,
    pub pasv_address: Option<String>,
    pub pasv_port_range: Option<(u16, u16)>,
    pub max_connections: usize,
    pub idle_timeout_secs: u64,
    pub data_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
    /// Bytes per second across all transfers, 0 for unlimited.
    pub rate_limit: u32,
    pub upload_buffer_size: usize,
    pub download_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: String::from("plugftpd"),
            listen_address: String::from("0.0.0.0"),
            listen_port: 2121,
            pasv_address: None,
            pasv_port_range: None,
            max_connections: 100,
            idle_timeout_secs: 300,
            data_timeout_secs: 30,
            shutdown_grace_secs: 10,
            rate_limit: 0,
            upload_buffer_size: 256 * 1024,   // Default 256 KB
            download_buffer_size: 128 * 1024, // Default 128 KB
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub driver: StorageKind,
    pub root_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageKind::File,
            root_dir: PathBuf::from("./ftp-data/root"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// bcrypt `user:hash` file; replaces username/password when set.
    pub passwd_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: String::from("admin"),
            password: String::from("admin"),
            passwd_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PermConfig {
    pub owner: String,
    pub group: String,
}

impl Default for PermConfig {
    fn default() -> Self {
        Self {
            owner: String::from("ftp"),
            group: String::from("ftp"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub perm: PermConfig,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!(
        "  Listen Address: {}:{}",
        config.server.listen_address, config.server.listen_port
    );
    if let Some(pasv_address) = &config.server.pasv_address {
        info!("  PASV Address: {}", pasv_address);
    }
    if let Some((low, high)) = config.server.pasv_port_range {
        info!("  PASV Ports: {}-{}", low, high);
    }
    info!("  Max Connections: {}", config.server.max_connections);
    info!("  Storage: {:?} ({})", config.storage.driver, config.storage.root_dir.display());
    match config.server.rate_limit {
        0 => info!("  Rate Limit: unlimited"),
        rate => info!("  Rate Limit: {} KB/s", rate / 1024),
    }
    info!(
        "  Upload Buffer Size: {} KB",
        config.server.upload_buffer_size / 1024
    );
    info!(
        "  Download Buffer Size: {} KB",
        config.server.download_buffer_size / 1024
    );
}
