use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Unable to open camera {0}")]
    CameraUnavailable(i32),
    #[error("Cascade classifier {0:?} is empty or missing")]
    EmptyCascade(PathBuf),
    #[error("Failed to write image {0:?}")]
    ImageWrite(PathBuf),
}
