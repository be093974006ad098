use serde::{Deserialize, Serialize};

/// A raw catalog row. The same `product_id` may appear on several rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub product_id: String,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub about_product: Option<String>,
}

impl RawRecord {
    /// Category segment before the first `|`, or the whole category when there
    /// is no delimiter.
    pub fn parent_category(&self) -> &str {
        let category = self.category.as_deref().unwrap_or_default();
        category.split('|').next().unwrap_or_default()
    }
}
