//! The immutable index bundle: products table, similarity matrix and the
//! name lookup, plus its persistence and the process-wide handle.

pub mod handle;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::normalize;
use crate::domain::product::Product;
use crate::domain::record::RawRecord;
use crate::errors::DataError;
use crate::similarity::{similarity, SimilarityMatrix};
use crate::text::TfidfVectorizer;

pub use handle::{global, install_global, IndexHandle};
pub use store::{ArtifactStore, Manifest, FORMAT_VERSION};

/// Product name to row indices. A name shared by several products maps to
/// all of their rows in ascending order; lookups resolve to the lowest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameIndex {
    entries: BTreeMap<String, Vec<usize>>,
}

impl NameIndex {
    pub fn from_products(products: &[Product]) -> Self {
        let mut entries: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, product) in products.iter().enumerate() {
            entries.entry(product.name.clone()).or_default().push(index);
        }
        Self { entries }
    }

    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.entries.get(name).and_then(|rows| rows.first()).copied()
    }

    pub fn rows(&self, name: &str) -> &[usize] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Output of one build. Never mutated after construction; a rebuild produces
/// a new bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexArtifacts {
    pub products: Vec<Product>,
    pub similarity: SimilarityMatrix,
    pub names: NameIndex,
    pub vocabulary_size: usize,
}

impl IndexArtifacts {
    /// Cross-checks the three parts against each other.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.similarity.dimension() != self.products.len() {
            return Err(format!(
                "similarity dimension {} does not match {} products",
                self.similarity.dimension(),
                self.products.len()
            ));
        }
        if self.names != NameIndex::from_products(&self.products) {
            return Err("name index does not match the products table".to_string());
        }
        Ok(())
    }

    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|product| product.name.as_str())
    }
}

/// Runs deduplication, DNA normalization, TF-IDF and cosine similarity over
/// raw catalog rows.
pub fn build_index(records: &[RawRecord]) -> Result<IndexArtifacts, DataError> {
    let products = normalize(records)?;
    info!(
        event_name = "build.products_normalized",
        record_count = records.len(),
        product_count = products.len(),
        "created unique product list"
    );

    let corpus: Vec<&str> = products.iter().map(|product| product.dna.as_str()).collect();
    let tfidf = TfidfVectorizer::new().fit_transform(&corpus);
    let (rows, columns) = tfidf.shape();
    info!(event_name = "build.tfidf_built", rows, columns, "tf-idf matrix built");

    let similarity = similarity(&tfidf.rows);
    let (rows, columns) = similarity.shape();
    info!(event_name = "build.similarity_built", rows, columns, "cosine similarity matrix built");

    let names = NameIndex::from_products(&products);

    Ok(IndexArtifacts { products, similarity, names, vocabulary_size: tfidf.vocabulary.len() })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{build_index, NameIndex};
    use crate::domain::record::RawRecord;
    use crate::errors::DataError;

    pub(crate) fn record(id: &str, name: &str, category: &str, about: Option<&str>) -> RawRecord {
        RawRecord {
            product_id: id.to_owned(),
            product_name: Some(name.to_owned()),
            category: Some(category.to_owned()),
            about_product: about.map(str::to_owned),
        }
    }

    pub(crate) fn sample_records() -> Vec<RawRecord> {
        vec![
            record("B01", "USB Cable", "Computers|Cables", Some("braided fast charging cable")),
            record("B02", "Lightning Cable", "Computers|Cables", Some("nylon charging cable")),
            record("B03", "Smart Watch", "Electronics|Wearables", Some("heart rate strap")),
            record("B01", "USB Cable", "Computers|Cables", Some("duplicate row")),
            record("B04", "USB Cable", "Computers|Cables", Some("coiled charging cable")),
            record("B05", "Desk Lamp", "Home|Lighting", None),
        ]
    }

    #[test]
    fn build_dedups_and_indexes_names() {
        let artifacts = build_index(&sample_records()).expect("build");

        assert_eq!(artifacts.products.len(), 5);
        assert_eq!(artifacts.similarity.shape(), (5, 5));
        assert_eq!(artifacts.names.rows("USB Cable"), &[0, 3]);
        assert_eq!(artifacts.names.resolve("USB Cable"), Some(0));
        assert_eq!(artifacts.names.resolve("Desk Lamp"), Some(4));
        assert!(artifacts.vocabulary_size > 0);
        assert!(artifacts.check_consistency().is_ok());
    }

    #[test]
    fn build_is_deterministic() {
        let first = build_index(&sample_records()).expect("first build");
        let second = build_index(&sample_records()).expect("second build");
        assert_eq!(first, second);
    }

    #[test]
    fn similarity_properties_hold() {
        let artifacts = build_index(&sample_records()).expect("build");
        let n = artifacts.products.len();
        for i in 0..n {
            assert_eq!(artifacts.similarity.get(i, i), Some(1.0));
            for j in 0..n {
                let score = artifacts.similarity.get(i, j).expect("in range");
                assert!((0.0..=1.0).contains(&score));
                assert_eq!(Some(score), artifacts.similarity.get(j, i));
            }
        }
    }

    #[test]
    fn empty_records_fail_with_data_error() {
        assert!(matches!(build_index(&[]), Err(DataError::EmptyCatalog)));
    }

    #[test]
    fn missing_name_indexes_under_empty_string() {
        let records = vec![RawRecord { product_id: "B9".to_owned(), ..RawRecord::default() }];
        let artifacts = build_index(&records).expect("build");
        assert_eq!(artifacts.names.resolve(""), Some(0));
        assert_eq!(artifacts.similarity.get(0, 0), Some(0.0));
    }

    #[test]
    fn inconsistent_bundle_is_detected() {
        let mut artifacts = build_index(&sample_records()).expect("build");
        artifacts.products.pop();
        assert!(artifacts.check_consistency().is_err());

        let mut artifacts = build_index(&sample_records()).expect("build");
        artifacts.names = NameIndex::default();
        assert!(artifacts.check_consistency().is_err());
    }
}
