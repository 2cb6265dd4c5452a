use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub esign: EsignConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Attempts for the post-creation quote refetch before surfacing a
    /// degraded-but-recoverable error.
    pub fetch_retries: u32,
    pub fetch_retry_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct EsignConfig {
    pub enabled: bool,
    pub integration_key: SecretString,
    pub account_id: String,
    pub consent_redirect_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub backend_base_url: Option<String>,
    pub log_level: Option<String>,
    pub esign_integration_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:5000".to_string(),
                timeout_secs: 30,
                fetch_retries: 3,
                fetch_retry_delay_ms: 300,
            },
            esign: EsignConfig {
                enabled: false,
                integration_key: String::new().into(),
                account_id: String::new(),
                consent_redirect_url: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    backend: Option<BackendPatch>,
    esign: Option<EsignPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    fetch_retries: Option<u32>,
    fetch_retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EsignPatch {
    enabled: Option<bool>,
    integration_key: Option<String>,
    account_id: Option<String>,
    consent_redirect_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("devisio.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
            }
            if let Some(fetch_retries) = backend.fetch_retries {
                self.backend.fetch_retries = fetch_retries;
            }
            if let Some(fetch_retry_delay_ms) = backend.fetch_retry_delay_ms {
                self.backend.fetch_retry_delay_ms = fetch_retry_delay_ms;
            }
        }

        if let Some(esign) = patch.esign {
            if let Some(enabled) = esign.enabled {
                self.esign.enabled = enabled;
            }
            if let Some(integration_key) = esign.integration_key {
                self.esign.integration_key = integration_key.into();
            }
            if let Some(account_id) = esign.account_id {
                self.esign.account_id = account_id;
            }
            if let Some(consent_redirect_url) = esign.consent_redirect_url {
                self.esign.consent_redirect_url = Some(consent_redirect_url);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DEVISIO_BACKEND_BASE_URL") {
            self.backend.base_url = value;
        }
        if let Some(value) = read_env("DEVISIO_BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = parse_u64("DEVISIO_BACKEND_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_BACKEND_FETCH_RETRIES") {
            self.backend.fetch_retries = parse_u32("DEVISIO_BACKEND_FETCH_RETRIES", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_BACKEND_FETCH_RETRY_DELAY_MS") {
            self.backend.fetch_retry_delay_ms =
                parse_u64("DEVISIO_BACKEND_FETCH_RETRY_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("DEVISIO_ESIGN_ENABLED") {
            self.esign.enabled = parse_bool("DEVISIO_ESIGN_ENABLED", &value)?;
        }
        if let Some(value) = read_env("DEVISIO_ESIGN_INTEGRATION_KEY") {
            self.esign.integration_key = value.into();
        }
        if let Some(value) = read_env("DEVISIO_ESIGN_ACCOUNT_ID") {
            self.esign.account_id = value;
        }
        if let Some(value) = read_env("DEVISIO_ESIGN_CONSENT_REDIRECT_URL") {
            self.esign.consent_redirect_url = Some(value);
        }

        let log_level = read_env("DEVISIO_LOGGING_LEVEL").or_else(|| read_env("DEVISIO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DEVISIO_LOGGING_FORMAT").or_else(|| read_env("DEVISIO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.backend_base_url {
            self.backend.base_url = base_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(integration_key) = overrides.esign_integration_key {
            self.esign.integration_key = integration_key.into();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backend(&self.backend)?;
        validate_esign(&self.esign)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("devisio.toml"), PathBuf::from("config/devisio.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    let url = backend.base_url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "backend.base_url must be an http(s) URL".to_string(),
        ));
    }

    if backend.timeout_secs == 0 || backend.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "backend.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if backend.fetch_retries == 0 {
        return Err(ConfigError::Validation(
            "backend.fetch_retries must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_esign(esign: &EsignConfig) -> Result<(), ConfigError> {
    if !esign.enabled {
        return Ok(());
    }

    if esign.integration_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "esign.integration_key is required when esign.enabled is true".to_string(),
        ));
    }
    if esign.account_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "esign.account_id is required when esign.enabled is true".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    if logging.level.trim().is_empty() {
        return Err(ConfigError::Validation("logging.level must not be empty".to_string()));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::default();
        config.validate().expect("defaults must be valid");
        assert_eq!(config.backend.fetch_retries, 3);
        assert_eq!(config.backend.fetch_retry_delay_ms, 300);
    }

    #[test]
    fn patch_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[backend]\nbase_url = \"https://devis.example.fr\"\nfetch_retries = 5\n\n[logging]\nlevel = \"debug\"\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load config");

        assert_eq!(config.backend.base_url, "https://devis.example.fr");
        assert_eq!(config.backend.fetch_retries, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some("does/not/exist.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect_err("missing file must fail");

        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn enabled_esign_requires_credentials() {
        let mut config = AppConfig::default();
        config.esign.enabled = true;
        let error = config.validate().expect_err("missing esign credentials");
        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            config_path: None,
            require_file: false,
            overrides: ConfigOverrides {
                backend_base_url: Some("http://127.0.0.1:8000".to_string()),
                log_level: Some("trace".to_string()),
                esign_integration_key: None,
            },
        })
        .expect("load config");

        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.logging.level, "trace");
    }
}
