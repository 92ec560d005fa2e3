use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "tubehub.toml",
    "config/tubehub.toml",
    "../tubehub.toml",
    "../config/tubehub.toml",
    "backend/tubehub.toml",
];

const ENV_PREFIX: &str = "TUBEHUB";
const CONFIG_PATH_VAR: &str = "TUBEHUB_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

impl AppConfig {
    /// Reject configurations the server cannot safely run with.
    ///
    /// Loading never calls this so that tooling can inspect partial
    /// configurations; the runtime calls it before opening any resources.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.access_token_secret.trim().is_empty() {
            bail!("auth.access_token_secret must be set");
        }
        if self.auth.refresh_token_secret.trim().is_empty() {
            bail!("auth.refresh_token_secret must be set");
        }
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            bail!("access and refresh token secrets must differ");
        }
        if self.auth.access_token_ttl_seconds == 0 || self.auth.refresh_token_ttl_seconds == 0 {
            bail!("token lifetimes must be greater than zero");
        }
        if self.media.max_upload_bytes == 0 {
            bail!("media.max_upload_bytes must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "HttpConfig::default_address")]
    pub address: String,
    #[serde(default = "HttpConfig::default_port")]
    pub port: u16,
    /// `*` allows every origin, anything else is a comma separated allow list.
    #[serde(default = "HttpConfig::default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "HttpConfig::default_json_body_limit")]
    pub json_body_limit_bytes: usize,
}

impl HttpConfig {
    fn default_address() -> String {
        "127.0.0.1".to_string()
    }

    const fn default_port() -> u16 {
        8000
    }

    fn default_cors_origin() -> String {
        "*".to_string()
    }

    const fn default_json_body_limit() -> usize {
        16 * 1024
    }

    /// Explicit origins from `cors_origin`, or `None` when every origin is allowed.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let trimmed = self.cors_origin.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return None;
        }

        Some(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            port: Self::default_port(),
            cors_origin: Self::default_cors_origin(),
            json_body_limit_bytes: Self::default_json_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tubehub.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Token signing and cookie settings.
///
/// ```
/// use tubehub_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.access_token_ttl_seconds, 86_400);
/// assert_eq!(auth.refresh_token_ttl_seconds, 864_000);
/// assert!(auth.secure_cookies);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub access_token_secret: String,
    #[serde(default = "AuthConfig::default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    #[serde(default)]
    pub refresh_token_secret: String,
    #[serde(default = "AuthConfig::default_refresh_ttl")]
    pub refresh_token_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_secure_cookies")]
    pub secure_cookies: bool,
}

impl AuthConfig {
    const fn default_access_ttl() -> u64 {
        86_400
    }

    const fn default_refresh_ttl() -> u64 {
        864_000
    }

    const fn default_secure_cookies() -> bool {
        true
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            access_token_ttl_seconds: Self::default_access_ttl(),
            refresh_token_secret: String::new(),
            refresh_token_ttl_seconds: Self::default_refresh_ttl(),
            secure_cookies: Self::default_secure_cookies(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written to and served from.
    #[serde(default = "MediaConfig::default_root")]
    pub root: PathBuf,
    /// URL path the media root is mounted under.
    #[serde(default = "MediaConfig::default_public_path")]
    pub public_path: String,
    #[serde(default = "MediaConfig::default_max_upload")]
    pub max_upload_bytes: usize,
}

impl MediaConfig {
    fn default_root() -> PathBuf {
        PathBuf::from("public")
    }

    fn default_public_path() -> String {
        "/static".to_string()
    }

    const fn default_max_upload() -> usize {
        5 * 1024 * 1024
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            public_path: Self::default_public_path(),
            max_upload_bytes: Self::default_max_upload(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use tubehub_config::load;
///
/// std::env::remove_var("TUBEHUB_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    load_from(None)
}

/// Same as [`load`], but an explicit file path takes precedence over
/// `TUBEHUB_CONFIG` and the default search locations.
pub fn load_from(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("http.cors_origin", defaults.http.cors_origin.clone())?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?;

    let config_path = explicit.or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

    if let Some(path) = config_path {
        debug!(path = %path.display(), "loading configuration from explicit path");
        builder = builder.add_source(config::File::from(path));
    } else if let Some(path) = discover_config_file() {
        debug!(path = %path.display(), "loading configuration file");
        builder = builder.add_source(config::File::from(path));
    } else {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(
        address = %config.http.address,
        port = config.http.port,
        database = %config.database.url,
        media_root = %config.media.root.display(),
        "loaded backend configuration"
    );
    Ok(config)
}

fn discover_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|candidate| cwd.join(candidate))
        .find(|path| path.exists())
}
