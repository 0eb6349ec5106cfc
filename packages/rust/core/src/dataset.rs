//! Two-column CSV form of a dataset.

use tracing::debug;

use trainset_shared::{Dataset, Result, TrainSetError, TrainingPair};

const HEADER: [&str; 2] = ["input", "output"];

/// Serialize `dataset` as CSV with an `input,output` header.
///
/// Fields are normalized first (line breaks to spaces, trimmed). Quoting is
/// minimal: only fields containing a comma or quote are quoted. Records end
/// with `\n`. An empty dataset yields the header line alone.
pub fn to_table(dataset: &Dataset) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER).map_err(csv_error)?;
    for pair in dataset.pairs() {
        let pair = pair.normalized();
        writer
            .write_record([pair.input.as_str(), pair.output.as_str()])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TrainSetError::Export(format!("failed to flush CSV: {e}")))?;
    let table =
        String::from_utf8(bytes).map_err(|e| TrainSetError::Export(format!("CSV is not UTF-8: {e}")))?;

    debug!(rows = dataset.len(), bytes = table.len(), "dataset serialized");
    Ok(table)
}

/// Read a table produced by [`to_table`] back into a dataset.
pub fn from_table(text: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| TrainSetError::parse(format!("invalid CSV header: {e}")))?;
    if headers.iter().ne(HEADER) {
        return Err(TrainSetError::validation(format!(
            "expected header 'input,output', found '{}'",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    reader
        .deserialize::<TrainingPair>()
        .map(|row| row.map_err(|e| TrainSetError::parse(format!("invalid CSV row: {e}"))))
        .collect()
}

fn csv_error(e: csv::Error) -> TrainSetError {
    TrainSetError::Export(format!("failed to write CSV: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pair_table() {
        let dataset = Dataset::from(vec![TrainingPair::new("Q1", "A1")]);
        assert_eq!(to_table(&dataset).unwrap(), "input,output\nQ1,A1\n");
    }

    #[test]
    fn empty_dataset_is_header_only() {
        let table = to_table(&Dataset::new()).unwrap();
        assert_eq!(table, "input,output\n");
        assert!(from_table(&table).unwrap().is_empty());
    }

    #[test]
    fn quotes_commas_and_quotes() {
        let dataset = Dataset::from(vec![TrainingPair::new(
            "What is \"move\", exactly?",
            "Transfer of ownership",
        )]);
        assert_eq!(
            to_table(&dataset).unwrap(),
            "input,output\n\"What is \"\"move\"\", exactly?\",Transfer of ownership\n"
        );
    }

    #[test]
    fn newlines_become_spaces() {
        let dataset = Dataset::from(vec![TrainingPair::new("  line one\nline two ", "a\r\nb")]);
        assert_eq!(to_table(&dataset).unwrap(), "input,output\nline one line two,a b\n");
    }

    #[test]
    fn round_trip_equals_normalized() {
        let dataset = Dataset::from(vec![
            TrainingPair::new("Q, with comma", "A \"quoted\"\nacross lines"),
            TrainingPair::new("", ""),
            TrainingPair::new("unicode: ñ ü 日本", "  padded  "),
            TrainingPair::new("[1,2]", "{\"k\":true}"),
        ]);

        let table = to_table(&dataset).unwrap();
        let back = from_table(&table).unwrap();
        let expected: Dataset = dataset.pairs().iter().map(TrainingPair::normalized).collect();
        assert_eq!(back, expected);
    }

    #[test]
    fn rejects_wrong_header() {
        let err = from_table("question,answer\nQ,A\n").unwrap_err();
        assert!(matches!(err, TrainSetError::Validation { .. }));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = from_table("input,output\nonly-one-field\n").unwrap_err();
        assert!(matches!(err, TrainSetError::Parse { .. }));
    }
}
