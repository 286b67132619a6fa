use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshfsmountError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mount-point conflict: {0}")]
    Conflict(String),

    #[error("Duplicate mount: {0}")]
    DuplicateMount(String),

    #[error("Not mounted: {0}")]
    NotMounted(String),

    #[error("Unmount failed: {0}")]
    Unmount(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SshfsmountError>;
