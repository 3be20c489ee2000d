use anyhow::{Context, Result};
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), max_body_bytes: default_max_body_bytes() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Where cover images live.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Prefix of the URLs handed out by the filesystem backend.
    /// Derived from `[server]` host and port when left empty.
    #[serde(default)]
    pub public_base_url: String,
    /// Base URL of the remote object store API (http backend).
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub write_token: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            root: default_storage_root(),
            public_base_url: String::new(),
            api_url: String::new(),
            write_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { token_secret: String::new(), cookie_name: default_cookie_name() }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_acquire_timeout() -> u64 { 30 }
// transport cap only; covers over 10 MiB are drained and rejected by validation
fn default_max_body_bytes() -> usize { 32 * 1024 * 1024 }
fn default_storage_root() -> String { "data/blobs".into() }
fn default_cookie_name() -> String { "token".into() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

/// `Ok(None)` only when the file does not exist; unreadable or malformed files are errors.
pub fn load_optional(path: &str) -> Result<Option<AppConfig>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).map(Some).with_context(|| format!("invalid config file {path}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::Error::new(e).context(format!("cannot read config file {path}"))),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Same as `load_and_validate`, but a missing config file falls back to
    /// defaults + environment instead of failing.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_optional(&config_path())?.unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        // 若 TOML 中未提供，则从环境变量填充
        self.database.normalize_from_env();
        self.database.validate()?;
        self.storage.normalize_from_env();
        self.storage.fill_public_base_url(&self.server);
        self.storage.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }

    /// Names of collaborator settings that are still empty after normalization.
    /// These are not startup errors; requests needing them are refused.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.database.url.trim().is_empty() { missing.push("DATABASE_URL"); }
        if !self.storage.is_configured() { missing.push("BLOB_READ_WRITE_TOKEN"); }
        if self.auth.token_secret.trim().is_empty() { missing.push("JWT_SECRET"); }
        missing
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() { self.host = host; }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.max_body_bytes == 0 {
            self.max_body_bytes = default_max_body_bytes();
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    /// An empty URL is allowed here; shape is only checked when a URL is present.
    pub fn validate(&self) -> Result<()> {
        if !self.url.trim().is_empty() {
            let lower = self.url.to_lowercase();
            if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
                return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
            }
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if self.write_token.trim().is_empty() {
            if let Ok(token) = std::env::var("BLOB_READ_WRITE_TOKEN") {
                self.write_token = token;
            }
        }
        if self.api_url.trim().is_empty() {
            if let Ok(url) = std::env::var("BLOB_API_URL") {
                self.api_url = url;
            }
        }
        if let Ok(backend) = std::env::var("BLOB_BACKEND") {
            match backend.as_str() {
                "http" => self.backend = StorageBackend::Http,
                "filesystem" => self.backend = StorageBackend::Filesystem,
                _ => {}
            }
        }
        self.public_base_url = self.public_base_url.trim_end_matches('/').to_string();
        self.api_url = self.api_url.trim_end_matches('/').to_string();
    }

    /// Filesystem covers are served by this server under `/blobs`.
    pub fn fill_public_base_url(&mut self, server: &ServerConfig) {
        if !self.public_base_url.trim().is_empty() {
            return;
        }
        let host = match server.host.as_str() {
            "0.0.0.0" | "::" => "127.0.0.1",
            h => h,
        };
        self.public_base_url = format!("http://{}:{}/blobs", host, server.port);
    }

    pub fn validate(&self) -> Result<()> {
        match self.backend {
            StorageBackend::Filesystem => {
                if self.root.trim().is_empty() {
                    return Err(anyhow!("storage.root is required for the filesystem backend"));
                }
                if self.public_base_url.trim().is_empty() {
                    return Err(anyhow!("storage.public_base_url is required for the filesystem backend"));
                }
            }
            StorageBackend::Http => {
                let lower = self.api_url.to_lowercase();
                if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                    return Err(anyhow!("storage.api_url must start with http(s) for the http backend"));
                }
            }
        }
        Ok(())
    }

    /// The filesystem backend needs no write credential.
    pub fn is_configured(&self) -> bool {
        match self.backend {
            StorageBackend::Filesystem => true,
            StorageBackend::Http => !self.write_token.trim().is_empty(),
        }
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.token_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.token_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.trim().is_empty() {
            return Err(anyhow!("auth.cookie_name must not be empty"));
        }
        Ok(())
    }
}
