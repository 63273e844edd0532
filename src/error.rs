use thiserror::Error;

/// Failures of the hosted record platform, as seen by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Http { status: u16, message: String },

    #[error("platform error: {0}")]
    Platform(String),

    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: i64 },

    #[error("no {table} record was accepted ({failed} failed)")]
    Rejected { table: &'static str, failed: usize },

    #[error("invalid record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Session(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (environment or config file)")]
    Missing(&'static str),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
