/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, DATABASE_URL, CORS 許可, 画像ディレクトリなど)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// None -> in-memory store
    pub database_url: Option<String>,
    pub db_max_connections: u32,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub sqids_min_length: usize,
    pub sqids_alphabet: String,

    pub image_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
}

pub const DEFAULT_SQIDS_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10u32)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid("DB_MAX_CONNECTIONS"));
        }

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let sqids_min_length = parse_or("SQIDS_MIN_LENGTH", 10usize)?;

        let sqids_alphabet = std::env::var("SQIDS_ALPHABET")
            .unwrap_or_else(|_| DEFAULT_SQIDS_ALPHABET.to_string());

        let image_dir = std::env::var("IMAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("images"));

        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024usize)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("MAX_UPLOAD_BYTES"));
        }

        let timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECS"));
        }

        Ok(Self {
            addr,
            database_url,
            db_max_connections,
            app_env,
            cors_allowed_origins,
            sqids_min_length,
            sqids_alphabet,
            image_dir,
            max_upload_bytes,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Development defaults with images under `image_dir` and no database.
    pub fn for_testing(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            db_max_connections: 1,
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            sqids_min_length: 10,
            sqids_alphabet: DEFAULT_SQIDS_ALPHABET.to_string(),
            image_dir: image_dir.into(),
            max_upload_bytes: 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

// Unset -> default, set but unparsable -> startup failure.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(s) => s.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_env_accepts_short_and_long_production_names() {
        assert_eq!(AppEnv::parse("production"), AppEnv::Production);
        assert_eq!(AppEnv::parse("PROD"), AppEnv::Production);
        assert_eq!(AppEnv::parse("staging"), AppEnv::Development);
    }

    #[test]
    fn config_error_names_the_key() {
        assert_eq!(
            ConfigError::Invalid("PORT").to_string(),
            "invalid configuration: PORT"
        );
    }
}
