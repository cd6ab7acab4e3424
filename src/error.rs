use thiserror::Error;

/// Failure of one batched value read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("batched read failed: {0}")]
    Read(String),
    #[error("short read: requested {requested} values, got {got}")]
    ShortRead { requested: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("value source: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
