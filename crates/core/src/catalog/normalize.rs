use std::collections::HashSet;

use crate::domain::product::{Product, ProductId};
use crate::domain::record::RawRecord;
use crate::errors::DataError;

/// Collapses raw rows to one product per `product_id`, keeping the first row
/// seen for each id and the order of first occurrence.
pub fn normalize(records: &[RawRecord]) -> Result<Vec<Product>, DataError> {
    if records.is_empty() {
        return Err(DataError::EmptyCatalog);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    let products = records
        .iter()
        .filter(|record| seen.insert(record.product_id.as_str()))
        .map(|record| Product {
            id: ProductId(record.product_id.clone()),
            name: record.product_name.clone().unwrap_or_default(),
            dna: product_dna(record),
        })
        .collect();

    Ok(products)
}

/// `name parent_category about`, single-space joined, with absent parts empty.
pub fn product_dna(record: &RawRecord) -> String {
    let name = record.product_name.as_deref().unwrap_or_default();
    let about = record.about_product.as_deref().unwrap_or_default();
    format!("{name} {} {about}", record.parent_category())
}
