use lookalike_core::config::ConfigOverrides;
use lookalike_core::index::install_global;
use lookalike_core::{load_index, recommend_scored, ApplicationError, InterfaceError};
use serde_json::json;

use crate::commands::{load_config, CommandResult};

pub fn run(product_name: &str, limit: Option<usize>) -> CommandResult {
    let config = match load_config(ConfigOverrides {
        recommend_limit: limit,
        ..ConfigOverrides::default()
    }) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("recommend", &error),
    };

    let artifacts = match load_index(&config.artifacts.dir) {
        Ok(artifacts) => artifacts,
        Err(error) => return CommandResult::application_failure("recommend", &error),
    };
    let index = install_global(artifacts).snapshot();

    match recommend_scored(product_name, &index, config.recommend.limit) {
        Ok(recommendations) => {
            CommandResult::success_with_data(
                "recommend",
                format!("top {} recommendations for `{product_name}`", recommendations.len()),
                Some(json!({
                    "product_name": product_name,
                    "recommendations": recommendations,
                })),
            )
        }
        Err(error) => {
            let error = ApplicationError::from(error);
            let class = error.error_class();
            let interface = InterfaceError::from(error);
            CommandResult::failure("recommend", class, interface.user_message(), 5)
        }
    }
}
