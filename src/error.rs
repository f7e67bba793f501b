use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("record store {} is corrupt: {reason}", path.display())]
    CorruptStore { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid relay url: {0}")]
    Url(#[from] url::ParseError),
}
