use crate::{CascadeDetector, DetectionParams, SnapshotStore, DEFAULT_CSV_NAME, FACE_CASCADE, SMILE_CASCADE};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(about = "Save a snapshot whenever the camera sees a smile")]
pub struct Args {
    /// Camera device index.
    #[clap(long, default_value_t = 0)]
    pub camera: i32,

    /// Face cascade XML. Defaults to the one bundled with OpenCV.
    #[clap(long)]
    pub face_cascade: Option<PathBuf>,

    /// Smile cascade XML. Defaults to the one bundled with OpenCV.
    #[clap(long)]
    pub smile_cascade: Option<PathBuf>,

    /// Directory receiving snapshots and the CSV log.
    #[clap(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// CSV log file name inside the output directory.
    #[clap(long, default_value = DEFAULT_CSV_NAME)]
    pub csv_name: String,

    /// Key poll timeout in milliseconds, also paces the loop.
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(i32).range(1..))]
    pub poll_ms: i32,
}

impl Args {
    pub fn face_detector(&self) -> anyhow::Result<CascadeDetector> {
        load_cascade(self.face_cascade.as_ref(), FACE_CASCADE, DetectionParams::FACE)
    }

    pub fn smile_detector(&self) -> anyhow::Result<CascadeDetector> {
        load_cascade(self.smile_cascade.as_ref(), SMILE_CASCADE, DetectionParams::SMILE)
    }

    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.output_dir, &self.csv_name)
    }
}

/// Load `path` if given, otherwise the named cascade bundled with OpenCV.
pub fn load_cascade(
    path: Option<&PathBuf>,
    bundled: &str,
    params: DetectionParams,
) -> anyhow::Result<CascadeDetector> {
    match path {
        Some(path) => CascadeDetector::new(path, params),
        None => CascadeDetector::bundled(bundled, params),
    }
}
