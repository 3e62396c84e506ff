use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed record at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("config: {0}")]
    Config(String),

    #[error("core: {0}")]
    Core(#[from] airstar_core::Error),
}
