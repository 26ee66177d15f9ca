use std::env;
use std::fs;
use std::path::Path;

use promo_core::config::{resolve_config_path, AppConfig};
use toml::Value;

use crate::commands::CommandResult;

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> CommandResult {
    let config_file_path = resolve_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "pricing.currency",
            &config.pricing.currency,
            source("pricing.currency", &["PROMO_PRICING_CURRENCY"]),
        ),
        render_line(
            "pricing.rounding_scale",
            &config.pricing.rounding_scale.to_string(),
            source("pricing.rounding_scale", &["PROMO_PRICING_ROUNDING_SCALE"]),
        ),
        render_line(
            "rules.numeric_coercion",
            config.rules.numeric_coercion.as_str(),
            source("rules.numeric_coercion", &["PROMO_RULES_NUMERIC_COERCION"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["PROMO_LOGGING_LEVEL", "PROMO_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            config.logging.format.as_str(),
            source("logging.format", &["PROMO_LOGGING_FORMAT", "PROMO_LOG_FORMAT"]),
        ),
    ];

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) =
        env_keys.iter().find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
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
