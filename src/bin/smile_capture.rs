use clap::Parser;
use log::LevelFilter;
use smile_capture::{init_logging, AppWindow, Args, CameraSource, CaptureLoop, Session, SmilePipeline};

fn main() -> anyhow::Result<()> {
    init_logging(LevelFilter::Info);
    let args: Args = Args::parse();

    let pipeline = SmilePipeline::new(args.face_detector()?, args.smile_detector()?);
    let camera_source = CameraSource::new(args.camera)?;
    let window = AppWindow::new(args.poll_ms)?;

    let mut capture = CaptureLoop::new(camera_source, window, pipeline, args.store());
    let mut session = Session::default();
    capture.run(&mut session)
}
