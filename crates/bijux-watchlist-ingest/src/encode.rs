// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_model::Dataset;
use csv::{Terminator, WriterBuilder};

use crate::IngestError;

/// Renders a dataset as comma-separated text, header first, in column order.
pub fn encode_comma_separated(dataset: &Dataset) -> Result<String, IngestError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(dataset.columns())
        .map_err(|e| IngestError(e.to_string()))?;
    for row in dataset.rows() {
        writer
            .write_record(dataset.columns().iter().map(|c| row.get(c).unwrap_or("")))
            .map_err(|e| IngestError(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| IngestError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| IngestError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bijux_watchlist_model::Delimiter;

    #[test]
    fn semicolon_dataset_is_reencoded_with_quoting() {
        let dataset = Dataset::from_records(
            vec!["id".to_string(), "note".to_string()],
            vec![vec!["1".to_string(), "a,b".to_string()]],
            Delimiter::Semicolon,
        )
        .expect("dataset");
        assert_eq!(
            encode_comma_separated(&dataset).expect("encode"),
            "id,note\n1,\"a,b\"\n"
        );
    }
}
