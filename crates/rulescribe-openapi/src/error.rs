use rulescribe_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenApiAnalyzerError {
    #[error("I/O error reading {0}: {1}")]
    Io(String, std::io::Error),

    #[error("document is empty")]
    EmptyDocument,

    #[error("document root must be a mapping (line {0})")]
    NonMappingRoot(usize),

    #[error(transparent)]
    Model(#[from] ModelError),
}
