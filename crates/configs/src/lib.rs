use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    /// Extra doctype schemas on top of the built-in `User`, `File` and roster doctypes.
    #[serde(default)]
    pub doctypes: Vec<DocTypeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), log_format: default_log_format() }
    }
}

fn default_log_format() -> String { "compact".into() }

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
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
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
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self { Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl() } }
}

fn default_token_ttl() -> i64 { 12 }

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Postgres through SeaORM
    Database,
    /// JSON file on disk (or memory only when `path` is empty)
    #[default]
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self { Self { backend: StoreBackend::File, path: default_store_path() } }
}

fn default_store_path() -> String { "data/records.json".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    /// Role granted by onboarding and required to list the roster.
    #[serde(default = "default_designated_role")]
    pub designated_role: String,
    /// Doctype holding one roster profile per user.
    #[serde(default = "default_profile_doctype")]
    pub profile_doctype: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self { designated_role: default_designated_role(), profile_doctype: default_profile_doctype() }
    }
}

fn default_designated_role() -> String { "Roster User".into() }
fn default_profile_doctype() -> String { "Roster User".into() }

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct DocTypeConfig {
    pub name: String,
    #[serde(default)]
    pub required: Vec<String>,
    /// Empty means any signed-in user may read.
    #[serde(default)]
    pub read_roles: Vec<String>,
    /// Empty means any signed-in user may write.
    #[serde(default)]
    pub write_roles: Vec<String>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
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
    /// Load `config.toml` when present, otherwise start from defaults and
    /// fill in from `SERVER_HOST`, `SERVER_PORT`, `DATABASE_URL`, `JWT_SECRET`.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(_) => {
                let mut cfg = AppConfig::default();
                if let Ok(host) = std::env::var("SERVER_HOST") { cfg.server.host = host; }
                if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                    cfg.server.port = port;
                }
                if let Ok(path) = std::env::var("STORE_PATH") { cfg.store.path = path; }
                cfg
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.roster.validate()?;
        for dt in &self.doctypes {
            if dt.name.trim().is_empty() {
                return Err(anyhow!("doctypes[].name must not be empty"));
            }
        }
        if self.store.backend == StoreBackend::Database {
            self.database.normalize_from_env();
            self.database.validate()?;
        }
        Ok(())
    }
}

impl ServerConfig {
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
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        Ok(())
    }
}

impl RosterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.designated_role.trim().is_empty() {
            return Err(anyhow!("roster.designated_role must not be empty"));
        }
        if self.profile_doctype.trim().is_empty() {
            return Err(anyhow!("roster.profile_doctype must not be empty"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // Fall back to DATABASE_URL when the TOML leaves the url out
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
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
