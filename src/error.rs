use reqwest::StatusCode;
use thiserror::Error;

/// Reasons an image fetch can fail. Callers use these to distinguish
/// transient upstream trouble from responses that will never be an image.
#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("invalid image endpoint: {0}")]
    Endpoint(String),

    #[error("image request timed out")]
    Timeout,

    #[error("image request failed: {0}")]
    Request(reqwest::Error),

    #[error("image endpoint returned HTTP {0}")]
    Status(StatusCode),

    #[error("response content type {0:?} is not an image")]
    BadContentType(String),

    #[error("response body too small to be an image ({0} bytes)")]
    TooSmall(usize),

    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ImageFetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ImageFetchError::Timeout
        } else {
            ImageFetchError::Request(e)
        }
    }
}

impl ImageFetchError {
    /// Transient failures are worth retrying later; the rest indicate the
    /// prompt or endpoint will keep producing garbage.
    pub fn is_transient(&self) -> bool {
        match self {
            ImageFetchError::Timeout => true,
            ImageFetchError::Request(_) => true,
            ImageFetchError::Status(code) => code.is_server_error(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),

    #[error("ffprobe returned an unreadable duration for {0}")]
    BadDuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("story contains no usable sentences")]
    NoScenes,

    #[error("image generation failed for every scene")]
    AllScenesFailed,

    #[error(transparent)]
    Video(#[from] VideoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Input-validation failures are the caller's fault; everything else is
    /// a generation failure.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PipelineError::NoScenes)
    }
}
