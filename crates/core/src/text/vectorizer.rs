use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::stopwords::is_stop_word;
use super::tokenize::tokenize;

/// A row of the TF-IDF matrix: strictly increasing column indices with their
/// weights.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|value| *value == 0.0)
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|value| value * value).sum::<f64>().sqrt()
    }

    /// Merge-join over the two sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut left, mut right) = (0, 0);
        let mut sum = 0.0;
        while left < self.indices.len() && right < other.indices.len() {
            match self.indices[left].cmp(&other.indices[right]) {
                std::cmp::Ordering::Less => left += 1,
                std::cmp::Ordering::Greater => right += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[left] * other.values[right];
                    left += 1;
                    right += 1;
                }
            }
        }
        sum
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

/// Document-term matrix, one row per input document. Columns follow the
/// lexicographic order of `vocabulary`.
#[derive(Clone, Debug, PartialEq)]
pub struct TfidfMatrix {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.vocabulary.len())
    }
}

/// Term-frequency/inverse-document-frequency weighting with English stop
/// words removed.
///
/// Weights are `count * idf` with the smoothed `idf = ln((1 + n) / (1 + df)) + 1`,
/// and every non-empty row is scaled to unit L2 norm. Documents with no
/// surviving tokens produce an empty row.
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    remove_stop_words: bool,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self { remove_stop_words: true }
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_words(mut self, remove: bool) -> Self {
        self.remove_stop_words = remove;
        self
    }

    pub fn analyze(&self, document: &str) -> Vec<String> {
        tokenize(document)
            .into_iter()
            .filter(|token| !self.remove_stop_words || !is_stop_word(token))
            .collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&self, corpus: &[S]) -> TfidfMatrix {
        let term_counts: Vec<BTreeMap<String, usize>> = corpus
            .iter()
            .map(|document| {
                let mut counts = BTreeMap::new();
                for token in self.analyze(document.as_ref()) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let vocabulary: Vec<String> = term_counts
            .iter()
            .flat_map(|counts| counts.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column_of: BTreeMap<&str, usize> =
            vocabulary.iter().enumerate().map(|(column, term)| (term.as_str(), column)).collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for counts in &term_counts {
            for term in counts.keys() {
                document_frequency[column_of[term.as_str()]] += 1;
            }
        }

        let documents = corpus.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|df| ((1.0 + documents) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let rows = term_counts
            .iter()
            .map(|counts| {
                // BTreeMap iteration is lexicographic, which matches column order.
                let mut row = SparseVector::default();
                for (term, count) in counts {
                    let column = column_of[term.as_str()];
                    row.indices.push(column);
                    row.values.push(*count as f64 * idf[column]);
                }
                let norm = row.norm();
                if norm > 0.0 {
                    row.values.iter_mut().for_each(|value| *value /= norm);
                }
                row
            })
            .collect();

        TfidfMatrix { vocabulary, idf, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::{SparseVector, TfidfVectorizer};

    const EPSILON: f64 = 1e-12;

    #[test]
    fn vocabulary_is_sorted_and_excludes_stop_words() {
        let matrix = TfidfVectorizer::new()
            .fit_transform(&["The braided USB cable", "A watch with the strap"]);

        assert_eq!(matrix.vocabulary, vec!["braided", "cable", "strap", "usb", "watch"]);
        assert_eq!(matrix.shape(), (2, 5));
    }

    #[test]
    fn rows_are_unit_length() {
        let matrix = TfidfVectorizer::new()
            .fit_transform(&["usb cable cable", "usb charger", "smart watch strap"]);

        for row in &matrix.rows {
            assert!((row.norm() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let matrix =
            TfidfVectorizer::new().fit_transform(&["usb cable", "usb charger", "usb hub"]);
        let usb = matrix.vocabulary.iter().position(|term| term == "usb").expect("usb");
        let cable = matrix.vocabulary.iter().position(|term| term == "cable").expect("cable");

        assert!((matrix.idf[usb] - 1.0).abs() < EPSILON);
        assert!(matrix.idf[cable] > matrix.idf[usb]);

        let row = &matrix.rows[0];
        let weight = |column: usize| {
            row.indices.iter().position(|index| *index == column).map(|at| row.values[at])
        };
        assert!(weight(cable) > weight(usb));
    }

    #[test]
    fn stop_word_only_document_yields_empty_row() {
        let matrix = TfidfVectorizer::new().fit_transform(&["usb cable", "the and of", "   "]);

        assert!(matrix.rows[1].is_zero());
        assert_eq!(matrix.rows[1].nnz(), 0);
        assert!(matrix.rows[2].is_zero());
    }

    #[test]
    fn empty_corpus_has_empty_vocabulary() {
        let corpus: [&str; 0] = [];
        let matrix = TfidfVectorizer::new().fit_transform(&corpus);
        assert_eq!(matrix.shape(), (0, 0));
    }

    #[test]
    fn identical_corpus_gives_identical_matrix() {
        let corpus = ["Wireless Mouse Computers silent click", "USB Cable Computers fast charge"];
        let first = TfidfVectorizer::new().fit_transform(&corpus);
        let second = TfidfVectorizer::new().fit_transform(&corpus);
        assert_eq!(first, second);
    }

    #[test]
    fn keeping_stop_words_widens_vocabulary() {
        let matrix = TfidfVectorizer::new().with_stop_words(false).fit_transform(&["the cable"]);
        assert_eq!(matrix.vocabulary, vec!["cable", "the"]);
    }

    #[test]
    fn dot_only_counts_shared_columns() {
        let left = SparseVector { indices: vec![0, 2, 5], values: vec![1.0, 2.0, 3.0] };
        let right = SparseVector { indices: vec![2, 3, 5], values: vec![4.0, 7.0, 0.5] };
        assert!((left.dot(&right) - 9.5).abs() < EPSILON);
    }
}
