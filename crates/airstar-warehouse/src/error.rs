use thiserror::Error;

use airstar_io::IoError;

pub type Result<T> = std::result::Result<T, WarehouseError>;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("cannot start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("backend '{0}' is not compiled in (enable the `{0}` feature)")]
    Unsupported(&'static str),

    #[error("schema: {0}")]
    Schema(String),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] IoError),
}
