use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Unknown metric name: {0}")]
    UnknownMetric(String),

    #[error("Registry configuration error: {0}")]
    RegistryConfig(String),

    #[error("Row has {actual} fields, query expects {expected}")]
    FieldCount { expected: usize, actual: usize },

    #[error("Conflicting exposition metadata for metric: {0}")]
    ExpositionConflict(String),

    #[error("Diagnostic tool invocation failed: {0}")]
    Smi(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
