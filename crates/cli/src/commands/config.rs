use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use devisio_core::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "backend.base_url",
        &config.backend.base_url,
        source("backend.base_url", "DEVISIO_BACKEND_BASE_URL"),
    ));
    lines.push(render_line(
        "backend.timeout_secs",
        &config.backend.timeout_secs.to_string(),
        source("backend.timeout_secs", "DEVISIO_BACKEND_TIMEOUT_SECS"),
    ));
    lines.push(render_line(
        "backend.fetch_retries",
        &config.backend.fetch_retries.to_string(),
        source("backend.fetch_retries", "DEVISIO_BACKEND_FETCH_RETRIES"),
    ));
    lines.push(render_line(
        "backend.fetch_retry_delay_ms",
        &config.backend.fetch_retry_delay_ms.to_string(),
        source("backend.fetch_retry_delay_ms", "DEVISIO_BACKEND_FETCH_RETRY_DELAY_MS"),
    ));

    lines.push(render_line(
        "esign.enabled",
        &config.esign.enabled.to_string(),
        source("esign.enabled", "DEVISIO_ESIGN_ENABLED"),
    ));
    lines.push(render_line(
        "esign.integration_key",
        &redact_secret(config.esign.integration_key.expose_secret()),
        source("esign.integration_key", "DEVISIO_ESIGN_INTEGRATION_KEY"),
    ));
    lines.push(render_line(
        "esign.account_id",
        &config.esign.account_id,
        source("esign.account_id", "DEVISIO_ESIGN_ACCOUNT_ID"),
    ));
    lines.push(render_line(
        "esign.consent_redirect_url",
        config.esign.consent_redirect_url.as_deref().unwrap_or("<unset>"),
        source("esign.consent_redirect_url", "DEVISIO_ESIGN_CONSENT_REDIRECT_URL"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "DEVISIO_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "DEVISIO_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("devisio.toml"), PathBuf::from("config/devisio.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        return "<empty>".to_string();
    }
    "<redacted>".to_string()
}
