use std::path::PathBuf;

pub type EsrResult<T> = Result<T, EsrError>;

/// Error taxonomy shared by ingestion and processing.
///
/// Ingestion errors are fatal to the load that produced them and propagate to
/// the caller untouched; `InvalidParameter` is a caller error reported before
/// any computation mutates the spectrum.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EsrError {
    #[error("unsupported file type '{extension}'")]
    UnsupportedFileType { extension: String },
    #[error("no usable numeric data column")]
    NoValidColumn,
    #[error("insufficient data: {rows} usable rows, need at least {minimum}")]
    InsufficientData { rows: usize, minimum: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

impl EsrError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

impl From<crate::numerics::ProcessingError> for EsrError {
    fn from(error: crate::numerics::ProcessingError) -> Self {
        Self::InvalidParameter(error.to_string())
    }
}
