//! Raw catalog input and its reduction to one product per id.

mod loader;
mod normalize;

pub use loader::{load_catalog, parse_catalog, REQUIRED_COLUMNS};
pub use normalize::{normalize, product_dna};
