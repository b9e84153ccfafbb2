use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    /// None of the recognized schedule sheets exist in the workbook.
    #[error("No schedule sheet found (expected one of: {}; found: {})", expected.join(", "), found.join(", "))]
    NoMatchingSheet {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl From<serde_yaml::Error> for ConvertError {
    fn from(e: serde_yaml::Error) -> Self {
        ConvertError::Config(e.to_string())
    }
}

impl From<calamine::Error> for ConvertError {
    fn from(e: calamine::Error) -> Self {
        ConvertError::Workbook(e.to_string())
    }
}
