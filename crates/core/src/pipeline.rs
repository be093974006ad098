use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::catalog::load_catalog;
use crate::errors::ApplicationError;
use crate::index::{build_index, ArtifactStore, IndexArtifacts};

/// Milestones of one build, reported to the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub record_count: usize,
    pub product_count: usize,
    pub vocabulary_size: usize,
    pub matrix_shape: (usize, usize),
}

/// Loads the catalog, builds the index and saves it. Nothing is written when
/// the catalog cannot be read or is invalid.
pub fn run_build(
    catalog_path: &Path,
    artifacts_dir: &Path,
) -> Result<BuildReport, ApplicationError> {
    let records = load_catalog(catalog_path)?;
    info!(
        event_name = "build.catalog_loaded",
        path = %catalog_path.display(),
        record_count = records.len(),
        "catalog loaded"
    );

    let artifacts = build_index(&records)?;
    ArtifactStore::new(artifacts_dir).save(&artifacts)?;

    Ok(BuildReport {
        record_count: records.len(),
        product_count: artifacts.products.len(),
        vocabulary_size: artifacts.vocabulary_size,
        matrix_shape: artifacts.similarity.shape(),
    })
}

pub fn load_index(artifacts_dir: &Path) -> Result<IndexArtifacts, ApplicationError> {
    Ok(ArtifactStore::new(artifacts_dir).load()?)
}
