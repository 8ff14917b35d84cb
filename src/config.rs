use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_KEY_PREFIX: &str = "publisher-kb";
const DEFAULT_EXTENSION: &str = ".txt";
const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,https://api-chatbot-frontend.vercel.app";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 360;
const DEFAULT_UPLOAD_MAX_BODY_BYTES: usize = 1024 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Where the file log layer writes, next to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// `logs/kbgateway.log` under the working directory.
    Default,
    /// Explicit file opened in append mode.
    File(PathBuf),
    /// Stdout only.
    Disabled,
}

/// Runtime configuration shared by the HTTP server and the batch tool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Object storage bucket receiving uploaded documents.
    pub bucket_name: String,
    /// Identifier of the managed knowledge base.
    pub knowledge_base_id: String,
    /// Identifier of the knowledge base data source pointing at the bucket.
    pub data_source_id: String,
    /// Region hosting the bucket and the knowledge base.
    pub region: String,
    /// Foundation model reference used for retrieve-and-generate.
    pub model_arn: String,
    /// Owning account, informational only.
    pub account_id: Option<String>,
    /// Prefix prepended to every storage key.
    pub key_prefix: String,
    /// Filename suffix accepted for uploads.
    pub allowed_extension: String,
    /// Use path-style bucket addressing (S3-compatible endpoints).
    pub s3_force_path_style: bool,
    /// Largest request body accepted by `POST /upload`.
    pub upload_max_body_bytes: usize,
    /// Port the HTTP server binds on all interfaces.
    pub server_port: u16,
    /// Browser origins allowed by the CORS layer.
    pub cors_allowed_origins: Vec<String>,
    /// Delay between two ingestion status lookups.
    pub poll_interval: Duration,
    /// Maximum number of status lookups before giving up on a job.
    pub poll_max_attempts: u32,
    /// Target of the file log layer.
    pub log_destination: LogDestination,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        Ok(Self {
            bucket_name: vars.required("KB_BUCKET_NAME")?,
            knowledge_base_id: vars.required("KNOWLEDGE_BASE_ID")?,
            data_source_id: vars.required("DATA_SOURCE_ID")?,
            region: vars
                .optional("AWS_REGION")
                .unwrap_or_else(|| DEFAULT_REGION.into()),
            model_arn: vars.required("MODEL_ARN")?,
            account_id: vars.optional("AWS_ACCOUNT_ID"),
            key_prefix: vars
                .optional("KB_KEY_PREFIX")
                .map(|value| value.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.into()),
            allowed_extension: vars
                .optional("KB_ALLOWED_EXTENSION")
                .unwrap_or_else(|| DEFAULT_EXTENSION.into()),
            s3_force_path_style: vars.parse("KB_S3_FORCE_PATH_STYLE")?.unwrap_or(false),
            upload_max_body_bytes: vars
                .parse("KB_UPLOAD_MAX_BODY_BYTES")?
                .unwrap_or(DEFAULT_UPLOAD_MAX_BODY_BYTES),
            server_port: vars.parse("SERVER_PORT")?.unwrap_or(DEFAULT_SERVER_PORT),
            cors_allowed_origins: split_origins(
                &vars
                    .optional("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into()),
            )?,
            poll_interval: Duration::from_secs(
                vars.parse("POLL_INTERVAL_SECS")?
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            poll_max_attempts: match vars.parse::<u32>("POLL_MAX_ATTEMPTS")? {
                Some(0) => return Err(ConfigError::InvalidValue("POLL_MAX_ATTEMPTS".into())),
                Some(value) => value,
                None => DEFAULT_POLL_MAX_ATTEMPTS,
            },
            log_destination: match (vars.0)("KB_LOG_FILE") {
                None => LogDestination::Default,
                Some(path) if path.trim().is_empty() => LogDestination::Disabled,
                Some(path) => LogDestination::File(PathBuf::from(path)),
            },
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.optional(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string()))
            })
            .transpose()
    }
}

/// Credentialed CORS cannot use a wildcard origin, so `*` is refused.
fn split_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::InvalidValue("CORS_ALLOWED_ORIGINS".into()));
    }
    Ok(origins)
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    CONFIG.set(config).expect("Failed to set config");
}

/// Log the non-secret parts of the loaded configuration.
pub fn log_config(config: &Config) {
    tracing::debug!(
        bucket = %config.bucket_name,
        knowledge_base_id = %config.knowledge_base_id,
        data_source_id = %config.data_source_id,
        region = %config.region,
        account_id = ?config.account_id,
        server_port = config.server_port,
        upload_max_body_bytes = config.upload_max_body_bytes,
        "Loaded configuration"
    );
}
