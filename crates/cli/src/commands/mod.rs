pub mod build;
pub mod config;
pub mod doctor;
pub mod products;
pub mod recommend;

use lookalike_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use lookalike_core::ApplicationError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        Self::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    }

    pub fn application_failure(command: &str, error: &ApplicationError) -> Self {
        let exit_code = match error {
            ApplicationError::Data(_) => 3,
            ApplicationError::Artifact(_) => 4,
            ApplicationError::Query(_) => 5,
        };
        Self::failure(command, error.error_class(), error.to_string(), exit_code)
    }
}

/// Loads configuration with the command-line overrides applied on top.
pub fn load_config(overrides: ConfigOverrides) -> Result<AppConfig, ConfigError> {
    AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
