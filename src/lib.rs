pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
mod utils;

use anyhow::{Context as _, anyhow};
use ffmpeg_next::{self as ffmpeg};
use std::io::Write;
use tracing::info;

//
// Re-export
//
pub use config::{Config, Invocation, RunConfig, program_name, usage};
pub use error::{PathRole, ResizeError, StreamRole};
pub use naming::{SAVE_EXT, save_path, save_path_now};
pub use pipeline::{
    DestinationStream, FramePipeline, FrameResizer, RunSummary, SourceStream, VideoSettings,
};
pub use utils::scaled_dimensions;

/// Converts `config.video_path` into a resized copy in `config.save_dir`,
/// printing progress to standard output.
pub fn run(config: &RunConfig) -> Result<RunSummary, ResizeError> {
    let stdout = std::io::stdout();
    run_with_progress(config, &mut stdout.lock())
}

/// Same as [`run`], with progress lines written to `progress`.
pub fn run_with_progress<W: Write>(
    config: &RunConfig,
    progress: &mut W,
) -> Result<RunSummary, ResizeError> {
    ffmpeg::init().map_err(|e| anyhow!("Failed to initialize FFmpeg: {e}"))?;

    let source = SourceStream::open(&config.video_path)?;
    writeln!(progress, "{} , {}", source.width(), source.height())
        .context("Failed to report video info")?;

    let save_path = save_path_now(&config.video_path, &config.save_dir, SAVE_EXT);
    let (width, height) = scaled_dimensions(source.width(), source.height(), config.scale);
    let settings = VideoSettings {
        codec: DestinationStream::encoder_for(config.codec.as_deref(), source.codec_id())?,
        width,
        height,
        frame_rate: source.frame_rate(),
        pixel_format: source.format(),
    };
    let destination = DestinationStream::create(&save_path, settings)?;

    let frames = FramePipeline::new(source, destination).run(progress)?;

    let summary = RunSummary {
        output_path: save_path,
        frames,
        width,
        height,
    };
    info!(?summary, "Resize completed successfully");
    Ok(summary)
}
