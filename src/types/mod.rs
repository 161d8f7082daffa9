use thiserror::Error;

mod credentials;
mod dates;

pub use credentials::*;
pub use dates::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid date: {input} - {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Date range is inverted: {start} is after {end}")]
    InvertedRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid username: {name} - {reason}")]
    InvalidUsername { name: String, reason: String },

    #[error("Value out of bounds: {value}, expected {min}..={max}")]
    OutOfBounds { value: usize, min: usize, max: usize },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}
