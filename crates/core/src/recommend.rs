use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::product::ProductId;
use crate::errors::QueryError;
use crate::index::IndexArtifacts;

pub const DEFAULT_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub index: usize,
    pub product_id: ProductId,
    pub name: String,
    pub score: f64,
}

/// Names of the five products most similar to `name`, best first.
pub fn recommend(name: &str, artifacts: &IndexArtifacts) -> Result<Vec<String>, QueryError> {
    Ok(recommend_scored(name, artifacts, DEFAULT_LIMIT)?
        .into_iter()
        .map(|recommendation| recommendation.name)
        .collect())
}

/// Ranks every other product against the one named `name`.
///
/// A name shared by several products resolves to the lowest row. Rows are
/// ordered by descending score with ties going to the lower row, and the
/// queried row itself is never returned.
pub fn recommend_scored(
    name: &str,
    artifacts: &IndexArtifacts,
    limit: usize,
) -> Result<Vec<Recommendation>, QueryError> {
    let Some(target) = artifacts.names.resolve(name) else {
        warn!(event_name = "query.not_found", product_name = name, "product not in index");
        return Err(QueryError::NotFound { name: name.to_string() });
    };
    let scores = artifacts
        .similarity
        .row(target)
        .ok_or_else(|| QueryError::NotFound { name: name.to_string() })?;

    let mut ranked: Vec<(usize, f64)> =
        scores.iter().copied().enumerate().filter(|(index, _)| *index != target).collect();
    // Stable sort keeps ascending row order among equal scores.
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));
    ranked.truncate(limit);

    let recommendations: Vec<Recommendation> = ranked
        .into_iter()
        .filter_map(|(index, score)| {
            artifacts.products.get(index).map(|product| Recommendation {
                index,
                product_id: product.id.clone(),
                name: product.name.clone(),
                score,
            })
        })
        .collect();

    debug!(
        event_name = "query.ranked",
        product_name = name,
        row = target,
        returned = recommendations.len(),
        "recommendations ranked"
    );
    Ok(recommendations)
}

/// Product names in table order, for selection lists.
pub fn product_names(artifacts: &IndexArtifacts) -> Vec<String> {
    artifacts.product_names().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::{product_names, recommend, recommend_scored};
    use crate::errors::QueryError;
    use crate::index::build_index;
    use crate::index::tests::{record, sample_records};

    #[test]
    fn ranks_shared_tokens_above_disjoint_and_skips_self() {
        let artifacts = build_index(&[
            record("A1", "Alpha", "Gadgets", Some("wireless speaker bass")),
            record("B1", "Beta", "Gadgets", Some("wireless speaker bass")),
            record("C1", "Gamma", "Kitchen", Some("ceramic teapot")),
        ])
        .expect("build");

        let names = recommend("Alpha", &artifacts).expect("alpha is indexed");
        assert_eq!(names, vec!["Beta".to_string(), "Gamma".to_string()]);
    }

    #[test]
    fn returns_at_most_five() {
        let records: Vec<_> = (0..8)
            .map(|n| {
                record(&format!("P{n}"), &format!("Item {n}"), "Home", Some("cotton towel"))
            })
            .collect();
        let artifacts = build_index(&records).expect("build");

        let names = recommend("Item 0", &artifacts).expect("indexed");
        assert_eq!(names.len(), 5);
        assert!(!names.contains(&"Item 0".to_string()));
    }

    #[test]
    fn equal_scores_keep_row_order() {
        let records: Vec<_> = ["Red Mug", "Blue Mug", "Green Mug", "Black Mug"]
            .iter()
            .enumerate()
            .map(|(n, name)| record(&format!("M{n}"), name, "Kitchen", Some("mug")))
            .collect();
        let artifacts = build_index(&records).expect("build");

        let scored = recommend_scored("Green Mug", &artifacts, 5).expect("indexed");
        let first_scores: Vec<f64> = scored.iter().map(|r| r.score).collect();
        assert!(first_scores.windows(2).all(|pair| pair[0] >= pair[1]));

        let artifacts_tied = build_index(&[
            record("T0", "Solo", "Misc", Some("anchor")),
            record("T1", "Xa", "Other", Some("unrelated")),
            record("T2", "Xb", "Other", Some("unrelated")),
        ])
        .expect("build");
        let scored = recommend_scored("Solo", &artifacts_tied, 5).expect("indexed");
        let rows: Vec<usize> = scored.iter().map(|r| r.index).collect();
        assert_eq!(rows, vec![1, 2]);
        assert!(scored.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let artifacts = build_index(&sample_records()).expect("build");
        let error = recommend("NonexistentProduct", &artifacts).expect_err("absent");
        assert_eq!(error, QueryError::NotFound { name: "NonexistentProduct".to_string() });
    }

    #[test]
    fn duplicate_name_resolves_to_lowest_row() {
        let artifacts = build_index(&sample_records()).expect("build");

        let first = recommend_scored("USB Cable", &artifacts, 5).expect("indexed");
        let second = recommend_scored("USB Cable", &artifacts, 5).expect("indexed");
        assert_eq!(first, second);
        // Row 0 is queried, so row 3 (same name, other id) is a candidate.
        assert!(first.iter().all(|r| r.index != 0));
        assert!(first.iter().any(|r| r.index == 3));
    }

    #[test]
    fn single_product_catalog_returns_nothing() {
        let artifacts = build_index(&[record("S1", "Only", "Misc", None)]).expect("build");
        assert!(recommend("Only", &artifacts).expect("indexed").is_empty());
    }

    #[test]
    fn product_names_follow_table_order() {
        let artifacts = build_index(&sample_records()).expect("build");
        assert_eq!(
            product_names(&artifacts),
            vec!["USB Cable", "Lightning Cable", "Smart Watch", "USB Cable", "Desk Lamp"]
        );
    }
}
