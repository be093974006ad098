//! Dense pairwise cosine similarity.
//!
//! The matrix holds `n * n` scores, so memory grows quadratically with the
//! catalog. That is acceptable for catalogs of a few tens of thousands of
//! products and is the known scaling limit of the index.

use serde::{Deserialize, Serialize};

use crate::text::SparseVector;

/// Square, symmetric, row-major matrix of scores in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    dimension: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Builds a matrix from raw row-major scores, checking the shape.
    pub fn from_scores(dimension: usize, scores: Vec<f64>) -> Result<Self, String> {
        if dimension.checked_mul(dimension) != Some(scores.len()) {
            return Err(format!(
                "{} scores cannot form a {dimension}x{dimension} matrix",
                scores.len()
            ));
        }
        Ok(Self { dimension, scores })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.dimension, self.dimension)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.dimension || column >= self.dimension {
            return None;
        }
        self.scores.get(row * self.dimension + column).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.dimension {
            return None;
        }
        let start = row * self.dimension;
        self.scores.get(start..start + self.dimension)
    }

    /// Checks the invariants a loaded matrix must satisfy: finite scores in
    /// `[0, 1]` and symmetry.
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension.checked_mul(self.dimension) != Some(self.scores.len()) {
            return Err(format!(
                "{} scores stored for a {}x{} matrix",
                self.scores.len(),
                self.dimension,
                self.dimension
            ));
        }
        for row in 0..self.dimension {
            for column in row..self.dimension {
                let score = self.scores[row * self.dimension + column];
                if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                    return Err(format!("score {score} at ({row}, {column}) is out of range"));
                }
                if score.to_bits() != self.scores[column * self.dimension + row].to_bits() {
                    return Err(format!("matrix is not symmetric at ({row}, {column})"));
                }
            }
        }
        Ok(())
    }
}

/// Cosine similarity of two sparse vectors; zero when either is a zero vector.
pub fn cosine_similarity(left: &SparseVector, right: &SparseVector) -> f64 {
    let denominator = left.norm() * right.norm();
    if denominator == 0.0 {
        return 0.0;
    }
    (left.dot(right) / denominator).clamp(0.0, 1.0)
}

/// Computes every pairwise score once over the upper triangle and mirrors
/// it, so the result is symmetric bit for bit. Non-zero rows score exactly
/// 1.0 against themselves; zero rows score 0 everywhere.
pub fn similarity(rows: &[SparseVector]) -> SimilarityMatrix {
    let dimension = rows.len();
    let norms: Vec<f64> = rows.iter().map(SparseVector::norm).collect();
    let mut scores = vec![0.0; dimension * dimension];

    for i in 0..dimension {
        if norms[i] == 0.0 {
            continue;
        }
        scores[i * dimension + i] = 1.0;
        for j in (i + 1)..dimension {
            if norms[j] == 0.0 {
                continue;
            }
            let score = (rows[i].dot(&rows[j]) / (norms[i] * norms[j])).clamp(0.0, 1.0);
            scores[i * dimension + j] = score;
            scores[j * dimension + i] = score;
        }
    }

    SimilarityMatrix { dimension, scores }
}
