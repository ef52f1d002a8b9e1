//! Error types shared by the directory client, storage and bridges

/// Result type alias for OwnTV operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Server answered with a non-200 status
    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// Home-screen integration refused the update
    #[error("Home screen sync failed: {0}")]
    Bridge(String),

    /// External player could not be started
    #[error("Player error: {0}")]
    Player(String),
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Http(Box::new(e))
    }
}
