//! Error type shared by the data, chart and export layers.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;
