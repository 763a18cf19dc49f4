use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Encoded image is implausibly small: {size} bytes (minimum {minimum})")]
    EncodeIntegrity { size: usize, minimum: usize },

    #[error("Only {unique} unique colors available, {requested} clusters requested")]
    DegenerateClusterInput { unique: usize, requested: usize },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, LensError>;

// Serialized as the display string so callers can hand it back as an error body
impl serde::Serialize for LensError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
