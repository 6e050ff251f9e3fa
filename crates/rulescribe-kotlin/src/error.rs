use rulescribe_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KotlinAnalyzerError {
    #[error("I/O error reading {0}: {1}")]
    Io(String, std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}
