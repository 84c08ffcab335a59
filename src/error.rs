use thiserror::Error;

/// Errors raised by the identity, calendar and assembly layers.
///
/// The parse and calendar variants are per-item failures: callers log the
/// offending path and move on to the next task. The `Unsupported*` variants
/// are configuration failures and abort a run before any I/O happens.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("filename does not match the {family} naming convention: {filename}")]
    MalformedIdentifier {
        family: &'static str,
        filename: String,
    },

    #[error("invalid dekad label {0:?}, expected one of D1, D2 or D3")]
    InvalidDekadLabel(String),

    #[error("invalid month {0}, expected a value in 1..=12")]
    InvalidMonth(u32),

    #[error("invalid date {value:?} in {filename}")]
    InvalidDate { filename: String, value: String },

    #[error("dataset {path} is missing required measurements: {missing:?}")]
    IncompleteDataset { path: String, missing: Vec<String> },

    #[error("unsupported product: {product}")]
    UnsupportedProduct { product: String },

    #[error("unsupported season: {season}")]
    UnsupportedSeason { season: String },

    #[error("unsupported year: {year}")]
    UnsupportedYear { year: String },
}
