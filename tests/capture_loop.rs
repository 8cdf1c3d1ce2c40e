use chrono::{NaiveDate, NaiveDateTime};
use opencv::core::{Rect, Scalar, CV_8UC3};
use opencv::prelude::*;
use smile_capture::{
    CaptureError, CaptureLoop, Control, Detector, FrameSource, Frontend, SaveOutcome, Session,
    SmilePipeline, SnapshotStore, Status, Step, MISSING_NAME_MESSAGE, SAVED_MESSAGE,
};
use std::collections::VecDeque;
use std::path::Path;

fn frame() -> Mat {
    Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::new(40.0, 80.0, 120.0, 0.0)).unwrap()
}

fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(15, 7, 30)
        .unwrap()
}

struct ScriptedSource {
    frames: VecDeque<Option<Mat>>,
    released: bool,
}

impl ScriptedSource {
    fn new(frames: Vec<Option<Mat>>) -> Self {
        Self {
            frames: frames.into(),
            released: false,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        Ok(self.frames.pop_front().flatten())
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.released = true;
        Ok(())
    }
}

/// Returns one scripted answer per call, then nothing.
struct ScriptedDetector(VecDeque<Vec<Rect>>);

impl ScriptedDetector {
    fn new(answers: Vec<Vec<Rect>>) -> Self {
        Self(answers.into())
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _image: &Mat) -> anyhow::Result<Vec<Rect>> {
        Ok(self.0.pop_front().unwrap_or_default())
    }
}

struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&mut self, _image: &Mat) -> anyhow::Result<Vec<Rect>> {
        Err(CaptureError::EmptyCascade("broken.xml".into()).into())
    }
}

#[derive(Default)]
struct RecordingFrontend {
    name: String,
    statuses: Vec<Status>,
    frames_shown: usize,
    warnings: Vec<String>,
    infos: Vec<String>,
    polls: usize,
    quit_after: Option<usize>,
    closed: bool,
    events: Vec<&'static str>,
}

impl RecordingFrontend {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    fn quitting_after(mut self, polls: usize) -> Self {
        self.quit_after = Some(polls);
        self
    }
}

impl Frontend for RecordingFrontend {
    fn show_frame(&mut self, _frame: &Mat) -> anyhow::Result<()> {
        self.frames_shown += 1;
        Ok(())
    }

    fn set_status(&mut self, status: Status) -> anyhow::Result<()> {
        self.statuses.push(status);
        self.events.push("status");
        Ok(())
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        self.events.push("refresh");
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn warn(&mut self, _title: &str, message: &str) {
        self.warnings.push(message.to_owned());
        self.events.push("warn");
    }

    fn inform(&mut self, _title: &str, message: &str) {
        self.infos.push(message.to_owned());
        self.events.push("inform");
    }

    fn poll(&mut self) -> anyhow::Result<Control> {
        self.polls += 1;
        match self.quit_after {
            Some(limit) if self.polls >= limit => Ok(Control::Quit),
            _ => Ok(Control::Continue),
        }
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.closed = true;
        Ok(())
    }
}

type TestLoop = CaptureLoop<ScriptedSource, RecordingFrontend, ScriptedDetector, ScriptedDetector>;

fn capture_loop(
    dir: &Path,
    frames: Vec<Option<Mat>>,
    faces: Vec<Vec<Rect>>,
    smiles: Vec<Vec<Rect>>,
    frontend: RecordingFrontend,
) -> TestLoop {
    CaptureLoop::new(
        ScriptedSource::new(frames),
        frontend,
        SmilePipeline::new(ScriptedDetector::new(faces), ScriptedDetector::new(smiles)),
        SnapshotStore::new(dir, "data.csv"),
    )
    .with_clock(fixed_clock)
}

fn csv_rows(dir: &Path) -> usize {
    let path = dir.join("data.csv");
    if !path.exists() {
        return 0;
    }
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .count()
}

fn face() -> Rect {
    Rect::new(20, 10, 80, 80)
}

fn smile() -> Rect {
    Rect::new(15, 45, 40, 20)
}

#[test]
fn no_face_reports_and_never_saves() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = capture_loop(
        dir.path(),
        vec![Some(frame())],
        vec![vec![]],
        vec![],
        RecordingFrontend::named("Bob"),
    );
    let mut session = Session::default();

    let step = capture.step(&mut session).unwrap();

    assert_eq!(
        step,
        Step::Processed {
            status: Status::NoFace,
            save: None
        }
    );
    assert_eq!(capture.frontend().statuses, vec![Status::NoFace]);
    assert_eq!(Status::NoFace.message(), "No Face Detected");
    assert_eq!(csv_rows(dir.path()), 0);
}

#[test]
fn face_without_smile_does_not_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = capture_loop(
        dir.path(),
        vec![Some(frame())],
        vec![vec![face()]],
        vec![vec![]],
        RecordingFrontend::named("Bob"),
    );
    let mut session = Session::default();

    let step = capture.step(&mut session).unwrap();

    assert_eq!(
        step,
        Step::Processed {
            status: Status::FaceWithoutSmile,
            save: None
        }
    );
    assert!(session.face_detected);
    assert!(!session.smile_detected);
    assert_eq!(csv_rows(dir.path()), 0);
    assert!(capture.frontend().infos.is_empty());
}

#[test]
fn smile_saves_once_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = capture_loop(
        dir.path(),
        vec![Some(frame()), Some(frame()), Some(frame())],
        vec![vec![face()], vec![face()], vec![face()]],
        vec![vec![smile()], vec![], vec![smile(), smile()]],
        RecordingFrontend::named("Bob"),
    );
    let mut session = Session::default();

    for _ in 0..3 {
        capture.step(&mut session).unwrap();
    }

    assert_eq!(
        capture.frontend().statuses,
        vec![
            Status::FaceWithSmile,
            Status::FaceWithoutSmile,
            Status::FaceWithSmile
        ]
    );
    assert_eq!(session.saves, 2);
    assert_eq!(csv_rows(dir.path()), 2);
    assert_eq!(capture.frontend().infos, vec![SAVED_MESSAGE, SAVED_MESSAGE]);
    assert!(dir.path().join("Bob_2024-05-01_03-07-PM.jpg").is_file());
}

#[test]
fn smile_in_second_face_still_counts() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = capture_loop(
        dir.path(),
        vec![Some(frame())],
        vec![vec![face(), Rect::new(100, 10, 50, 50)]],
        vec![vec![], vec![Rect::new(5, 25, 30, 15)]],
        RecordingFrontend::named("Bob"),
    );
    let mut session = Session::default();

    let step = capture.step(&mut session).unwrap();

    match step {
        Step::Processed {
            status: Status::FaceWithSmile,
            save: Some(SaveOutcome::Saved(record)),
        } => assert_eq!(record.image_filename, "Bob_2024-05-01_03-07-PM.jpg"),
        other => panic!("unexpected step {:?}", other),
    }
}

#[test]
fn empty_name_warns_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = capture_loop(
        dir.path(),
        vec![Some(frame())],
        vec![vec![face()]],
        vec![vec![smile()]],
        RecordingFrontend::named(""),
    );
    let mut session = Session::default();

    let step = capture.step(&mut session).unwrap();

    assert_eq!(
        step,
        Step::Processed {
            status: Status::FaceWithSmile,
            save: Some(SaveOutcome::MissingName)
        }
    );
    assert_eq!(capture.frontend().warnings, vec![MISSING_NAME_MESSAGE]);
    assert!(capture.frontend().infos.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn missing_frame_skips_the_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = capture_loop(
        dir.path(),
        vec![None],
        vec![vec![face()]],
        vec![vec![smile()]],
        RecordingFrontend::named("Bob"),
    );
    let mut session = Session {
        face_detected: true,
        smile_detected: true,
        ..Default::default()
    };

    let step = capture.step(&mut session).unwrap();

    assert_eq!(step, Step::NoFrame);
    assert!(!session.face_detected);
    assert!(!session.smile_detected);
    assert!(session.frame.is_none());
    assert_eq!(capture.frontend().frames_shown, 0);
    assert!(capture.frontend().statuses.is_empty());
}

#[test]
fn runs_until_quit_then_releases() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![Some(frame()), None, Some(frame()), Some(frame())];
    let mut capture = capture_loop(
        dir.path(),
        frames,
        vec![],
        vec![],
        RecordingFrontend::named("Bob").quitting_after(3),
    );
    let mut session = Session::default();

    capture.run(&mut session).unwrap();

    assert_eq!(capture.frontend().polls, 3);
    assert_eq!(capture.frontend().frames_shown, 2);
    assert!(capture.frontend().closed);
    assert!(capture.source().released);
}

#[test]
fn errors_still_release_resources() {
    let dir = tempfile::tempdir().unwrap();
    let mut capture = CaptureLoop::new(
        ScriptedSource::new(vec![Some(frame())]),
        RecordingFrontend::named("Bob"),
        SmilePipeline::new(FailingDetector, ScriptedDetector::new(vec![])),
        SnapshotStore::new(dir.path(), "data.csv"),
    );
    let mut session = Session::default();

    let err = capture.run(&mut session).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CaptureError>(),
        Some(CaptureError::EmptyCascade(_))
    ));
    assert!(capture.frontend().closed);
    assert!(capture.source().released);
}

#[test]
fn status_is_painted_before_save_dialog() {
    for (name, dialog) in [("Bob", "inform"), ("", "warn")] {
        let dir = tempfile::tempdir().unwrap();
        let mut capture = capture_loop(
            dir.path(),
            vec![Some(frame()), Some(frame())],
            vec![vec![face()], vec![face()]],
            vec![vec![], vec![smile()]],
            RecordingFrontend::named(name),
        );
        let mut session = Session::default();

        capture.step(&mut session).unwrap();
        capture.step(&mut session).unwrap();

        assert_eq!(
            capture.frontend().events,
            vec!["status", "status", "refresh", dialog]
        );
    }
}
