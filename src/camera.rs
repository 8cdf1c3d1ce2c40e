use crate::CaptureError;
use log::{debug, info, warn};
use opencv::prelude::*;
use opencv::videoio;

/// Anything the loop can pull color frames from.
pub trait FrameSource {
    /// Next frame, or `None` when the device produced nothing this time.
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>>;

    fn release(&mut self) -> anyhow::Result<()>;
}

pub struct CameraSource {
    index: i32,
    cam: videoio::VideoCapture,
    released: bool,
}

impl CameraSource {
    pub fn new(index: i32) -> anyhow::Result<Self> {
        let cam = videoio::VideoCapture::new(index, videoio::CAP_ANY)?;
        if !videoio::VideoCapture::is_opened(&cam)? {
            return Err(CaptureError::CameraUnavailable(index).into());
        }
        info!("Opened camera {}", index);
        Ok(Self {
            index,
            cam,
            released: false,
        })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        let mut frame = Mat::default();
        let grabbed = self.cam.read(&mut frame)?;
        if !grabbed || frame.size()?.width == 0 {
            debug!("Camera {} returned no frame", self.index);
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) -> anyhow::Result<()> {
        if self.released {
            return Ok(());
        }
        self.cam.release()?;
        self.released = true;
        info!("Released camera {}", self.index);
        Ok(())
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("Failed to release camera {}: {}", self.index, err);
        }
    }
}
