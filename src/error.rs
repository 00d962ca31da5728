use thiserror::Error;

/// Errors raised while building apertures, transforming them, or exporting results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Computation failure: {0}")]
    ComputationFailure(String),

    #[error("Failed to render image: {0}")]
    Render(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::InvalidParameter(msg.into()))
}

/// Rejects negative or non-finite lengths. Zero is allowed and gives an empty region.
pub(crate) fn check_length(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return invalid(format!("{} must be finite, got {}", name, value));
    }
    if value < 0.0 {
        return invalid(format!("{} must not be negative, got {}", name, value));
    }
    Ok(())
}
