//! Snapshot images and the CSV log written when a smile is seen.

use crate::CaptureError;
use chrono::NaiveDateTime;
use log::{info, warn};
use opencv::core::Vector;
use opencv::imgcodecs;
use opencv::prelude::*;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Timestamp used in image filenames, e.g. `2024-05-01_03-07-PM`.
pub const FILENAME_TIME_FORMAT: &str = "%Y-%m-%d_%I-%M-%p";
/// Timestamp written to the CSV log, e.g. `2024-05-01 03:07 PM`.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

pub const DEFAULT_CSV_NAME: &str = "data.csv";

/// One row of the CSV log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmileRecord {
    pub name: String,
    pub timestamp: String,
    pub image_filename: String,
}

impl SmileRecord {
    /// Both timestamps come from the same instant, truncated to the minute
    /// by the formats.
    pub fn new(name: &str, at: NaiveDateTime) -> Self {
        let image_filename = format!("{}_{}.jpg", name, at.format(FILENAME_TIME_FORMAT));
        Self {
            name: name.to_owned(),
            timestamp: at.format(LOG_TIME_FORMAT).to_string(),
            image_filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    MissingName,
    Saved(SmileRecord),
}

/// Writes images and appends log rows inside one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    csv_name: String,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, csv_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            csv_name: csv_name.into(),
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(&self.csv_name)
    }

    pub fn save(&self, name: &str, frame: &Mat, at: NaiveDateTime) -> anyhow::Result<SaveOutcome> {
        if name.is_empty() {
            warn!("Smile detected but no name entered, nothing saved");
            return Ok(SaveOutcome::MissingName);
        }

        let record = SmileRecord::new(name, at);
        let image_path = self.dir.join(&record.image_filename);
        write_jpeg(&image_path, frame)?;
        self.append(&record)?;

        info!(
            "Saved {:?} and logged {} at {}",
            image_path, record.name, record.timestamp
        );
        Ok(SaveOutcome::Saved(record))
    }

    fn append(&self, record: &SmileRecord) -> anyhow::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.csv_path())?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}

pub fn write_jpeg(path: &Path, frame: &Mat) -> anyhow::Result<()> {
    let params: Vector<i32> = Vector::new();
    let written = imgcodecs::imwrite(&path.to_string_lossy(), frame, &params)?;
    if !written {
        return Err(CaptureError::ImageWrite(path.to_owned()).into());
    }
    Ok(())
}
