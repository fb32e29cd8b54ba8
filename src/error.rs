use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GenevizError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Covers both absent and forbidden resources. Callers must not be able to
    /// tell the two apart.
    #[error("dataset not found or not authorized")]
    NotFoundOrUnauthorized,

    #[error("uploaded file is not valid UTF-8 text: {0}")]
    Decode(String),

    #[error("empty file")]
    EmptyFile,

    #[error("invalid TSV header: {0}")]
    #[diagnostic(help("the first column must be one of gene-id, gene, gene_name, geneid"))]
    InvalidHeader(String),

    #[error("no data found")]
    NoData,

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl GenevizError {
    /// Stable, transport-independent category for this failure.
    pub fn category(&self) -> &'static str {
        match self {
            GenevizError::InvalidRequest(_) => "invalid_request",
            GenevizError::NotFoundOrUnauthorized => "not_found",
            GenevizError::Decode(_) => "decode_error",
            GenevizError::EmptyFile => "empty_file",
            GenevizError::InvalidHeader(_) => "invalid_header",
            GenevizError::NoData => "no_data",
            GenevizError::Conflict(_) | GenevizError::Store(_) => "store_error",
            GenevizError::ConfigRead(_) | GenevizError::ConfigParse(_) => "config_error",
            GenevizError::Filesystem(_) => "filesystem_error",
        }
    }
}
