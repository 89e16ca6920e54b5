/// Errors that can occur while rendering records into a container
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// I/O error on the container file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error serializing a record as JSON
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error rendering a CSV row
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),

    /// Codec options are unusable
    #[error("Invalid codec options: {0}")]
    InvalidOptions(String),
}
