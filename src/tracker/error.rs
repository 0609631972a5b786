use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame source exhausted")]
    EndOfStream,
    #[error("frame source not open")]
    NotOpen,
    #[error("frame source not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no region matching the color range")]
    NotFound,
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}
