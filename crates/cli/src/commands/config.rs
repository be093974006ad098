use std::env;
use std::fs;
use std::path::Path;

use lookalike_core::config::{discover_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = discover_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "catalog.path",
            &config.catalog.path.display().to_string(),
            source("catalog.path", &["LOOKALIKE_CATALOG_PATH"]),
        ),
        render_line(
            "artifacts.dir",
            &config.artifacts.dir.display().to_string(),
            source("artifacts.dir", &["LOOKALIKE_ARTIFACTS_DIR"]),
        ),
        render_line(
            "recommend.limit",
            &config.recommend.limit.to_string(),
            source("recommend.limit", &["LOOKALIKE_RECOMMEND_LIMIT"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["LOOKALIKE_LOGGING_LEVEL", "LOOKALIKE_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["LOOKALIKE_LOGGING_FORMAT", "LOOKALIKE_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
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
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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
