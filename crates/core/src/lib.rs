pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod index;
pub mod pipeline;
pub mod recommend;
pub mod similarity;
pub mod text;

pub use domain::product::{Product, ProductId};
pub use domain::record::RawRecord;
pub use errors::{ApplicationError, ArtifactError, DataError, InterfaceError, QueryError};
pub use index::{build_index, ArtifactStore, IndexArtifacts, IndexHandle, NameIndex};
pub use pipeline::{load_index, run_build, BuildReport};
pub use recommend::{product_names, recommend, recommend_scored, Recommendation};
pub use similarity::SimilarityMatrix;
