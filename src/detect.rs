use crate::CaptureError;
use log::info;
use opencv::core::{Rect, Scalar, Vector};
use opencv::prelude::*;
use opencv::{core, imgproc, objdetect};
use std::path::{Path, PathBuf};

pub const FACE_CASCADE: &str = "haarcascades/haarcascade_frontalface_default.xml";
pub const SMILE_CASCADE: &str = "haarcascades/haarcascade_smile.xml";

/// Tuning passed to `detect_multi_scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: (i32, i32),
}

impl DetectionParams {
    pub const FACE: DetectionParams = DetectionParams {
        scale_factor: 1.1,
        min_neighbors: 5,
        min_size: (30, 30),
    };

    pub const SMILE: DetectionParams = DetectionParams {
        scale_factor: 1.3,
        min_neighbors: 25,
        min_size: (30, 30),
    };
}

/// Returns bounding boxes for one kind of pattern in a grayscale image.
pub trait Detector {
    fn detect(&mut self, image: &Mat) -> anyhow::Result<Vec<Rect>>;
}

pub struct CascadeDetector {
    classifier: objdetect::CascadeClassifier,
    params: DetectionParams,
}

impl CascadeDetector {
    pub fn new(path: &Path, params: DetectionParams) -> anyhow::Result<Self> {
        let classifier = objdetect::CascadeClassifier::new(&path.to_string_lossy())?;
        if classifier.empty()? {
            return Err(CaptureError::EmptyCascade(path.to_owned()).into());
        }
        info!("Loaded cascade {:?}", path);
        Ok(Self { classifier, params })
    }

    /// Resolve a cascade shipped with OpenCV, e.g. [`FACE_CASCADE`].
    pub fn bundled(name: &str, params: DetectionParams) -> anyhow::Result<Self> {
        let xml = core::find_file_def(name)?;
        Self::new(&PathBuf::from(xml), params)
    }
}

impl Detector for CascadeDetector {
    fn detect(&mut self, image: &Mat) -> anyhow::Result<Vec<Rect>> {
        let mut found: Vector<Rect> = Vector::new();

        self.classifier.detect_multi_scale(
            image,
            &mut found,
            self.params.scale_factor,
            self.params.min_neighbors,
            objdetect::CASCADE_SCALE_IMAGE,
            core::Size {
                width: self.params.min_size.0,
                height: self.params.min_size.1,
            },
            core::Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(found.to_vec())
    }
}

/// One face box and the smiles found inside it, in frame coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceHit {
    pub face: Rect,
    pub smiles: Vec<Rect>,
}

#[derive(Debug)]
pub struct Analysis {
    pub annotated: Mat,
    pub faces: Vec<FaceHit>,
}

impl Analysis {
    pub fn face_detected(&self) -> bool {
        !self.faces.is_empty()
    }

    pub fn smile_detected(&self) -> bool {
        self.faces.iter().any(|hit| !hit.smiles.is_empty())
    }
}

pub fn face_color() -> Scalar {
    Scalar::new(255.0, 0.0, 0.0, 0.0)
}

pub fn smile_color() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

/// Face detector over the whole frame, smile detector over each face.
pub struct SmilePipeline<F, S> {
    faces: F,
    smiles: S,
}

impl<F: Detector, S: Detector> SmilePipeline<F, S> {
    pub fn new(faces: F, smiles: S) -> Self {
        Self { faces, smiles }
    }

    pub fn analyze(&mut self, frame: &Mat) -> anyhow::Result<Analysis> {
        let mut annotated = frame.try_clone()?;
        let frame_grayscale = convert_to_grayscale(frame)?;

        let mut faces = Vec::new();
        for face in self.faces.detect(&frame_grayscale)? {
            draw_box(&mut annotated, face, face_color())?;

            let face_grayscale = Mat::roi(&frame_grayscale, face)?.try_clone()?;
            let mut smiles = Vec::new();
            for smile in self.smiles.detect(&face_grayscale)? {
                // smile boxes come back relative to the face region
                let smile = Rect::new(face.x + smile.x, face.y + smile.y, smile.width, smile.height);
                draw_box(&mut annotated, smile, smile_color())?;
                smiles.push(smile);
            }
            faces.push(FaceHit { face, smiles });
        }

        Ok(Analysis { annotated, faces })
    }
}

pub fn draw_box(image: &mut Mat, rect: Rect, color: Scalar) -> anyhow::Result<()> {
    imgproc::rectangle(image, rect, color, 2, imgproc::LINE_8, 0)?;
    Ok(())
}

pub fn convert_to_grayscale(image: &Mat) -> anyhow::Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(&image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}
