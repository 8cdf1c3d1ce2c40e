use crate::{Control, Detector, FrameSource, Frontend, SaveOutcome, SmilePipeline, SnapshotStore, Status};
use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use opencv::prelude::*;

pub const MISSING_NAME_TITLE: &str = "Error";
pub const MISSING_NAME_MESSAGE: &str = "Please enter your name before saving the image.";
pub const SAVED_TITLE: &str = "Success";
pub const SAVED_MESSAGE: &str = "Name, timestamp, and image saved successfully!";

/// Per-run state, reset and refilled every frame.
#[derive(Debug, Default)]
pub struct Session {
    pub frame: Option<Mat>,
    pub face_detected: bool,
    pub smile_detected: bool,
    pub status: Option<Status>,
    pub saves: usize,
}

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    NoFrame,
    Processed {
        status: Status,
        save: Option<SaveOutcome>,
    },
}

pub struct CaptureLoop<S, F, D1, D2> {
    source: S,
    frontend: F,
    pipeline: SmilePipeline<D1, D2>,
    store: SnapshotStore,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<S, F, D1, D2> CaptureLoop<S, F, D1, D2>
where
    S: FrameSource,
    F: Frontend,
    D1: Detector,
    D2: Detector,
{
    pub fn new(source: S, frontend: F, pipeline: SmilePipeline<D1, D2>, store: SnapshotStore) -> Self {
        Self {
            source,
            frontend,
            pipeline,
            store,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Capture, detect, annotate, display and maybe save one frame.
    pub fn step(&mut self, session: &mut Session) -> anyhow::Result<Step> {
        session.face_detected = false;
        session.smile_detected = false;

        let Some(frame) = self.source.next_frame()? else {
            debug!("No frame this iteration");
            return Ok(Step::NoFrame);
        };

        let analysis = self.pipeline.analyze(&frame)?;
        session.face_detected = analysis.face_detected();
        session.smile_detected = analysis.smile_detected();

        self.frontend.show_frame(&analysis.annotated)?;

        let status = Status::from_flags(session.face_detected, session.smile_detected);
        session.status = Some(status);
        self.frontend.set_status(status)?;

        let save = if status.triggers_save() {
            self.frontend.refresh()?;
            Some(self.save(session, &frame)?)
        } else {
            None
        };
        session.frame = Some(frame);
        Ok(Step::Processed { status, save })
    }

    /// Saves the clean frame, not the annotated one.
    fn save(&mut self, session: &mut Session, frame: &Mat) -> anyhow::Result<SaveOutcome> {
        let name = self.frontend.name();
        let outcome = self.store.save(&name, frame, (self.clock)())?;
        match &outcome {
            SaveOutcome::MissingName => self.frontend.warn(MISSING_NAME_TITLE, MISSING_NAME_MESSAGE),
            SaveOutcome::Saved(_) => {
                session.saves += 1;
                self.frontend.inform(SAVED_TITLE, SAVED_MESSAGE);
            }
        }
        Ok(outcome)
    }

    fn drive(&mut self, session: &mut Session) -> anyhow::Result<()> {
        loop {
            self.step(session)?;
            if self.frontend.poll()? == Control::Quit {
                return Ok(());
            }
        }
    }

    /// Loop until quit, then release the camera and window on every path.
    pub fn run(&mut self, session: &mut Session) -> anyhow::Result<()> {
        let result = self.drive(session);
        if let Err(err) = &result {
            warn!("Capture loop stopped: {}", err);
        }

        let released = self.source.release();
        let closed = self.frontend.close();
        info!("Capture loop finished after {} saves", session.saves);

        result?;
        released?;
        closed?;
        Ok(())
    }
}
