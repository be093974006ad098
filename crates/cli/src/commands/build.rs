use std::path::PathBuf;

use lookalike_core::config::ConfigOverrides;
use lookalike_core::run_build;
use serde_json::json;
use tracing::{error, info};

use crate::commands::{load_config, CommandResult};

pub fn run(catalog: Option<PathBuf>, artifacts: Option<PathBuf>) -> CommandResult {
    let config = match load_config(ConfigOverrides {
        catalog_path: catalog,
        artifacts_dir: artifacts,
        ..ConfigOverrides::default()
    }) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("build", &error),
    };

    info!(
        event_name = "build.started",
        catalog = %config.catalog.path.display(),
        artifacts = %config.artifacts.dir.display(),
        "starting index build"
    );

    match run_build(&config.catalog.path, &config.artifacts.dir) {
        Ok(report) => {
            info!(
                event_name = "build.completed",
                product_count = report.product_count,
                "index build complete"
            );
            CommandResult::success_with_data(
                "build",
                format!(
                    "built index for {} products from {} records; artifacts saved to `{}`",
                    report.product_count,
                    report.record_count,
                    config.artifacts.dir.display()
                ),
                Some(json!({
                    "record_count": report.record_count,
                    "product_count": report.product_count,
                    "vocabulary_size": report.vocabulary_size,
                    "matrix_shape": [report.matrix_shape.0, report.matrix_shape.1],
                    "artifacts_dir": config.artifacts.dir.display().to_string(),
                })),
            )
        }
        Err(failure) => {
            error!(
                event_name = "build.failed",
                error_class = failure.error_class(),
                error = %failure,
                "index build failed"
            );
            CommandResult::application_failure("build", &failure)
        }
    }
}
