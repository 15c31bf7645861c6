//! CSV column extraction

use std::io::Read;

use crate::error::{Error, Result};

/// Read the named columns from CSV data with a header row
///
/// Each returned row holds the requested cells in the order of `columns`, trimmed.
/// Short rows yield empty cells. Header names are matched exactly after trimming
/// whitespace and a leading byte-order mark.
///
/// # Errors
/// Returns [`Error::Schema`] naming every requested column absent from the header,
/// or [`Error::Csv`] when the data is not valid CSV.
pub fn read_columns<R: Read>(
    reader: R,
    columns: &[&str],
    source_name: &str,
) -> Result<Vec<Vec<String>>> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = csv
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut positions = Vec::with_capacity(columns.len());
    let mut missing = Vec::new();
    for column in columns {
        match headers.iter().position(|h| h == column) {
            Some(index) => positions.push(index),
            None => missing.push((*column).to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::Schema {
            source_name: source_name.to_string(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        rows.push(
            positions
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().trim().to_string())
                .collect(),
        );
    }
    Ok(rows)
}
