use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiBenchmarkError {
    #[error("Please upload a CSV file (got '{0}')")]
    UnsupportedFile(String),

    #[error("The uploaded file is empty")]
    EmptyFile,

    #[error("No valid data rows found in CSV file")]
    NoValidRows,

    #[error("Please map at least one KPI to continue")]
    NoKpisMapped,

    #[error("No valid numeric data found. Please check your CSV format.")]
    NoNumericValues,

    #[error("Unknown KPI key: {0}")]
    UnknownKpi(String),

    #[error("Industry not found: {0}")]
    IndustryNotFound(String),

    #[error("Failed to load industry benchmarks: {0}")]
    BenchmarkUnavailable(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("LLM request timed out after {0} seconds")]
    LlmTimeout(u64),

    #[error("Insight payload failed validation: {0}")]
    InvalidInsightPayload(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing failed: {0}")]
    CsvError(#[from] csv::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Pipeline step an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStage {
    Ingestion,
    Mapping,
    Benchmark,
    Insight,
}

impl KpiBenchmarkError {
    pub fn stage(&self) -> ErrorStage {
        match self {
            Self::UnsupportedFile(_)
            | Self::EmptyFile
            | Self::NoValidRows
            | Self::IoError(_)
            | Self::CsvError(_) => ErrorStage::Ingestion,
            Self::NoKpisMapped | Self::NoNumericValues | Self::UnknownKpi(_) => {
                ErrorStage::Mapping
            }
            Self::IndustryNotFound(_) | Self::BenchmarkUnavailable(_) => ErrorStage::Benchmark,
            Self::Llm(_)
            | Self::LlmTimeout(_)
            | Self::InvalidInsightPayload(_)
            | Self::SerializationError(_) => ErrorStage::Insight,
            #[cfg(feature = "http")]
            Self::HttpError(_) => ErrorStage::Insight,
        }
    }

    /// Insight-stage errors are recovered internally and never shown to the user.
    pub fn is_user_facing(&self) -> bool {
        self.stage() != ErrorStage::Insight
    }
}

pub type Result<T> = std::result::Result<T, KpiBenchmarkError>;
