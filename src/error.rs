use thiserror::Error;

/// Failures raised by option configuration, mapping resolution and the
/// read/write operations.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Duplicate name: {0}")]
    DuplicateName(String),
    #[error("The worksheet '{name}' does not exist in workbook")]
    SheetNotFound { name: String },
    #[error("Sheet index {index} is out of range for a workbook with {count} sheet(s)")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Missing argument '{0}'")]
    ArgumentMissing(&'static str),
    #[error("Invalid property expression: {0}")]
    InvalidExpression(String),
    #[error("Failed to convert '{name}' at row {row}: {source:#}")]
    Conversion {
        name: String,
        row: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Worker failed: {0}")]
    Worker(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T, E = SheetError> = std::result::Result<T, E>;

impl SheetError {
    pub(crate) fn conversion(name: &str, row: usize, source: anyhow::Error) -> Self {
        SheetError::Conversion {
            name: name.to_string(),
            row,
            source,
        }
    }
}
