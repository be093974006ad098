//! Text features: tokenization, stop words and TF-IDF weighting.

pub mod stopwords;
pub mod tokenize;
pub mod vectorizer;

pub use vectorizer::{SparseVector, TfidfMatrix, TfidfVectorizer};
