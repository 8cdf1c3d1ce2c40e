use clap::Parser;
use log::LevelFilter;
use opencv::highgui;
use opencv::prelude::*;
use smile_capture::{
    init_logging, load_cascade, write_jpeg, DetectionParams, SmilePipeline, Status, FACE_CASCADE,
    SMILE_CASCADE,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Run face and smile detection on a still image")]
struct AnnotateArgs {
    /// Image to analyze.
    image: PathBuf,

    /// Write the annotated image here instead of showing it.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Face cascade XML. Defaults to the one bundled with OpenCV.
    #[clap(long)]
    face_cascade: Option<PathBuf>,

    /// Smile cascade XML. Defaults to the one bundled with OpenCV.
    #[clap(long)]
    smile_cascade: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging(LevelFilter::Info);
    let args = AnnotateArgs::parse();

    let frame = opencv::imgcodecs::imread_def(&args.image.to_string_lossy())?;
    if frame.size()?.width == 0 {
        anyhow::bail!("Unable to read image {:?}", args.image);
    }

    let faces = load_cascade(args.face_cascade.as_ref(), FACE_CASCADE, DetectionParams::FACE)?;
    let smiles = load_cascade(args.smile_cascade.as_ref(), SMILE_CASCADE, DetectionParams::SMILE)?;
    let mut pipeline = SmilePipeline::new(faces, smiles);
    let analysis = pipeline.analyze(&frame)?;

    let status = Status::from_flags(analysis.face_detected(), analysis.smile_detected());
    println!("{}", status.message());
    for hit in &analysis.faces {
        println!("face {:?} smiles: {}", hit.face, hit.smiles.len());
    }

    match args.output {
        Some(output) => write_jpeg(&output, &analysis.annotated)?,
        None => {
            let window = "annotated";
            highgui::named_window_def(window)?;
            highgui::imshow(window, &analysis.annotated)?;
            highgui::wait_key(0)?;
            highgui::destroy_all_windows()?;
        }
    }

    Ok(())
}
