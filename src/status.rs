use opencv::core::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Warning,
    Success,
}

impl Style {
    /// BGR text color.
    pub fn color(self) -> Scalar {
        match self {
            Style::Warning => Scalar::new(0.0, 0.0, 255.0, 0.0),
            Style::Success => Scalar::new(0.0, 255.0, 0.0, 0.0),
        }
    }
}

/// What the status label says about the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoFace,
    FaceWithoutSmile,
    FaceWithSmile,
}

impl Status {
    pub fn from_flags(face_detected: bool, smile_detected: bool) -> Self {
        match (face_detected, smile_detected) {
            (false, _) => Status::NoFace,
            (true, false) => Status::FaceWithoutSmile,
            (true, true) => Status::FaceWithSmile,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Status::NoFace => "No Face Detected",
            Status::FaceWithoutSmile => "Face Detected - Smile Not Detected",
            Status::FaceWithSmile => "Face Detected - Smile Detected",
        }
    }

    pub fn style(self) -> Style {
        match self {
            Status::FaceWithSmile => Style::Success,
            _ => Style::Warning,
        }
    }

    pub fn triggers_save(self) -> bool {
        self == Status::FaceWithSmile
    }
}
