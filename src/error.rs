#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read config file: {0}")]
    Config(#[from] ini::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange failed with HTTP {status}: {body}")]
    TokenExchange { status: u16, body: String },

    #[error("Moves API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Failed to rewrite GPX document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Failed to format date: {0}")]
    TimeFormat(#[from] time::error::Format),

    #[error("Failed to write GPX: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

pub type Result<T> = std::result::Result<T, Error>;
