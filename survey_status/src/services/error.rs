//! Errors raised while classifying exposures and fields.

/// Result type for classification operations
pub type StatusResult<T> = Result<T, StatusError>;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// A field carries an observation date but no done flag. The join or the
    /// upstream data is inconsistent and nothing derived from it can be trusted.
    #[error("Consistency error: field {field_id} has date {date} but done == 0")]
    Consistency { field_id: String, date: String },

    #[error("Malformed exposure at row {row}: no field id in object '{object}'")]
    MalformedObject { row: usize, object: String },

    #[error("Malformed exposure at row {row}: {metric} = {value} is not a measurement or -1")]
    InvalidMetric {
        row: usize,
        metric: &'static str,
        value: f64,
    },

    #[error("Quality policy lists ({program}, {filter}) more than once")]
    DuplicatePolicy { program: String, filter: String },
}
