use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to read local tags: {0}")]
    Read(String),

    #[error("Catalog search failed: {0}")]
    Search(String),

    #[error("Failed to apply update: {0}")]
    Update(String),

    #[error("Batch item failed: {0}")]
    Item(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
