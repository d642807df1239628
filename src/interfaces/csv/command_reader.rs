use crate::error::{PainError, Result};
use std::io::Read;

/// Reads command vectors from a CSV source, one command per line.
///
/// Lines carry no header and may differ in length; every field is kept as a
/// string for the command codec to interpret.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields each line's fields.
    pub fn commands(self) -> impl Iterator<Item = Result<Vec<String>>> {
        self.reader.into_records().map(|result| {
            result
                .map(|record| record.iter().map(str::to_string).collect())
                .map_err(PainError::from)
        })
    }
}
