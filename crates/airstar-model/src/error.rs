use thiserror::Error;

use airstar_io::IoError;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("table '{table}' needs column '{column}'")]
    MissingColumn { table: &'static str, column: String },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Core(#[from] airstar_core::Error),
}
