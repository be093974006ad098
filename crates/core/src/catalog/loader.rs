use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::domain::record::RawRecord;
use crate::errors::DataError;

/// Header names every catalog must carry, in the order rows are read.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["product_id", "product_name", "category", "about_product"];

/// Reads a delimiter-separated catalog file with a header row.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, DataError> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|source| DataError::Io { path: path.to_path_buf(), source })?;
    let records = parse_catalog(file)?;
    debug!(
        event_name = "catalog.loaded",
        path = %path.display(),
        record_count = records.len(),
        "catalog file parsed"
    );
    Ok(records)
}

/// Parses catalog rows from any reader. Columns beyond the required four are
/// ignored and empty cells are read as absent values.
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<RawRecord>, DataError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers().map_err(|error| malformed(&error, 1))?.clone();
    let mut positions = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|header| header.trim() == column)
            .ok_or(DataError::MissingColumn(column))?;
    }
    let [id_at, name_at, category_at, about_at] = positions;

    let mut records = Vec::new();
    for (offset, row) in reader.records().enumerate() {
        let row = row.map_err(|error| malformed(&error, offset as u64 + 2))?;
        let cell = |at: usize| row.get(at).filter(|value| !value.is_empty()).map(str::to_owned);

        records.push(RawRecord {
            product_id: cell(id_at).unwrap_or_default(),
            product_name: cell(name_at),
            category: cell(category_at),
            about_product: cell(about_at),
        });
    }

    if records.is_empty() {
        return Err(DataError::EmptyCatalog);
    }

    Ok(records)
}

fn malformed(error: &csv::Error, fallback_row: u64) -> DataError {
    let row = error.position().map(csv::Position::line).unwrap_or(fallback_row);
    DataError::MalformedRow { row, message: error.to_string() }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{load_catalog, parse_catalog, REQUIRED_COLUMNS};
    use crate::errors::DataError;

    const CATALOG: &str = "\
product_id,product_name,category,about_product,rating
B01,USB Cable,Computers|Accessories|Cables,Fast charging braided cable,4.2
B02,Smart Watch,Electronics|Wearables,,4.0
B01,USB Cable,Computers|Accessories|Cables,Duplicate row,4.2
";

    #[test]
    fn parses_rows_and_ignores_extra_columns() {
        let records = parse_catalog(CATALOG.as_bytes()).expect("catalog should parse");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].product_id, "B01");
        assert_eq!(records[0].product_name.as_deref(), Some("USB Cable"));
        assert_eq!(records[0].parent_category(), "Computers");
        assert_eq!(records[2].about_product.as_deref(), Some("Duplicate row"));
    }

    #[test]
    fn empty_cells_become_absent() {
        let records = parse_catalog(CATALOG.as_bytes()).expect("catalog should parse");
        assert_eq!(records[1].about_product, None);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let raw = "product_id,product_name,category,about_product\n\
                   B09,\"Cable, 2m\",Home,\"Soft, durable\"\n";
        let records = parse_catalog(raw.as_bytes()).expect("catalog should parse");
        assert_eq!(records[0].product_name.as_deref(), Some("Cable, 2m"));
        assert_eq!(records[0].about_product.as_deref(), Some("Soft, durable"));
    }

    #[test]
    fn missing_required_column_is_a_data_error() {
        let raw = "product_id,product_name,about_product\nB01,Cable,Nice\n";
        let error = parse_catalog(raw.as_bytes()).expect_err("category column is missing");
        assert!(matches!(error, DataError::MissingColumn("category")));
    }

    #[test]
    fn every_required_column_is_enforced() {
        for missing in REQUIRED_COLUMNS {
            let header: Vec<&str> =
                REQUIRED_COLUMNS.into_iter().filter(|column| *column != missing).collect();
            let raw = format!("{}\nB01,Cable,Nice\n", header.join(","));
            let error = parse_catalog(raw.as_bytes()).expect_err("a column is missing");
            assert!(matches!(error, DataError::MissingColumn(column) if column == missing));
        }
    }

    #[test]
    fn required_columns_may_appear_in_any_order() {
        let raw = "about_product,category,rating,product_name,product_id\n\
                   braided,Computers|Cables,4.1,USB Cable,B01\n";
        let records = parse_catalog(raw.as_bytes()).expect("catalog should parse");
        assert_eq!(records[0].product_id, "B01");
        assert_eq!(records[0].product_name.as_deref(), Some("USB Cable"));
        assert_eq!(records[0].about_product.as_deref(), Some("braided"));
    }

    #[test]
    fn header_only_catalog_is_empty() {
        let raw = "product_id,product_name,category,about_product\n";
        let error = parse_catalog(raw.as_bytes()).expect_err("no rows");
        assert!(matches!(error, DataError::EmptyCatalog));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().expect("tempdir");
        let error = load_catalog(dir.path().join("absent.csv")).expect_err("file is absent");
        assert!(matches!(error, DataError::Io { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("amazon.csv");
        fs::write(&path, CATALOG).expect("write catalog");

        let records = load_catalog(&path).expect("catalog should load");
        assert_eq!(records.len(), 3);
    }
}
