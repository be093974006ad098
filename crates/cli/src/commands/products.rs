use lookalike_core::config::ConfigOverrides;
use lookalike_core::{load_index, product_names};
use serde_json::json;

use crate::commands::{load_config, CommandResult};

pub fn run(contains: Option<&str>) -> CommandResult {
    let config = match load_config(ConfigOverrides::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("products", &error),
    };

    let artifacts = match load_index(&config.artifacts.dir) {
        Ok(artifacts) => artifacts,
        Err(error) => return CommandResult::application_failure("products", &error),
    };

    let needle = contains.map(str::to_lowercase);
    let names: Vec<String> = product_names(&artifacts)
        .into_iter()
        .filter(|name| {
            needle.as_deref().map_or(true, |needle| name.to_lowercase().contains(needle))
        })
        .collect();

    CommandResult::success_with_data(
        "products",
        format!("{} of {} products", names.len(), artifacts.products.len()),
        Some(json!({ "products": names })),
    )
}
