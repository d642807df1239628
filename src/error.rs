use thiserror::Error;

#[derive(Error, Debug)]
pub enum PainError {
    #[error("Authorization error: {0}")]
    AuthorizationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Routing unsupported: {0}")]
    RoutingUnsupportedError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PainError {
    /// Prefixes the message with the name of the component the error passed through.
    ///
    /// Boundary variants (`CsvError`, `IoError`) are returned unchanged.
    pub fn within(self, component: &str) -> Self {
        let prefix = |msg: String| format!("{component}: {msg}");
        match self {
            Self::AuthorizationError(msg) => Self::AuthorizationError(prefix(msg)),
            Self::ValidationError(msg) => Self::ValidationError(prefix(msg)),
            Self::NotFoundError(msg) => Self::NotFoundError(prefix(msg)),
            Self::PersistenceError(msg) => Self::PersistenceError(prefix(msg)),
            Self::RoutingUnsupportedError(msg) => Self::RoutingUnsupportedError(prefix(msg)),
            Self::ConfigError(msg) => Self::ConfigError(prefix(msg)),
            other => other,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PainError {
    fn from(err: rocksdb::Error) -> Self {
        Self::PersistenceError(err.into_string())
    }
}

impl From<serde_json::Error> for PainError {
    fn from(err: serde_json::Error) -> Self {
        Self::PersistenceError(format!("Serialization error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PainError>;
