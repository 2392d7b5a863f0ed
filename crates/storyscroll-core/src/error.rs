use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Measurement unavailable: {0}")]
    MeasurementUnavailable(&'static str),

    #[error("Failed to load asset {asset}: {reason}")]
    AssetLoad { asset: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Engine has been unmounted")]
    Unmounted,
}

pub type Result<T> = std::result::Result<T, Error>;
