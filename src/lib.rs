mod camera;
mod config;
mod detect;
mod error;
mod record;
mod session;
mod status;
mod window;

pub use camera::{CameraSource, FrameSource};
pub use config::{load_cascade, Args};
pub use detect::{
    convert_to_grayscale, draw_box, face_color, smile_color, Analysis, CascadeDetector,
    DetectionParams, Detector, FaceHit, SmilePipeline, FACE_CASCADE, SMILE_CASCADE,
};
pub use error::CaptureError;
pub use record::{
    write_jpeg, SaveOutcome, SmileRecord, SnapshotStore, DEFAULT_CSV_NAME, FILENAME_TIME_FORMAT,
    LOG_TIME_FORMAT,
};
pub use session::{
    CaptureLoop, Session, Step, MISSING_NAME_MESSAGE, MISSING_NAME_TITLE, SAVED_MESSAGE,
    SAVED_TITLE,
};
pub use status::{Status, Style};
pub use window::{AppWindow, Control, Frontend, KeyAction, NameEntry, WINDOW_TITLE};

use log::LevelFilter;

/// Initialize logging, honoring `RUST_LOG` when set.
pub fn init_logging(default_filter: LevelFilter) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    // already initialized is fine
    let _ = builder.try_init();
}
