mod destination;
mod source;

pub use destination::{DestinationStream, VideoSettings};
pub use source::SourceStream;

use crate::error::ResizeError;
use anyhow::Context as _;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame;
use ffmpeg_next::software::scaling::context::Context as Scaler;
use ffmpeg_next::software::scaling::flag::Flags;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Outcome of a completed conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
}

/// Bilinear resize of decoded frames to a fixed size and pixel format.
///
/// The scaling context is built from the first frame and rebuilt only if
/// the input geometry or format changes mid-stream.
pub struct FrameResizer {
    width: u32,
    height: u32,
    format: Pixel,
    scaler: Option<((Pixel, u32, u32), Scaler)>,
}

impl FrameResizer {
    pub fn new(width: u32, height: u32, format: Pixel) -> Self {
        Self {
            width,
            height,
            format,
            scaler: None,
        }
    }

    pub fn resize(&mut self, input: &frame::Video, output: &mut frame::Video) -> anyhow::Result<()> {
        let source = (input.format(), input.width(), input.height());
        let mut scaler = match self.scaler.take() {
            Some((key, scaler)) if key == source => scaler,
            _ => {
                debug!(
                    from = ?source,
                    to = ?(self.format, self.width, self.height),
                    "Building video scaler"
                );
                Scaler::get(
                    source.0,
                    source.1,
                    source.2,
                    self.format,
                    self.width,
                    self.height,
                    Flags::BILINEAR,
                )
                .context("Video Scaler: Failed to create context")?
            }
        };
        let result = scaler.run(input, output).context("Video Scaler: Error resizing frame");
        self.scaler = Some((source, scaler));
        result
    }
}

/// Read, resize, write until the source is exhausted.
pub struct FramePipeline {
    source: SourceStream,
    destination: DestinationStream,
    resizer: FrameResizer,
}

impl FramePipeline {
    pub fn new(source: SourceStream, destination: DestinationStream) -> Self {
        let resizer = FrameResizer::new(
            destination.width(),
            destination.height(),
            destination.format(),
        );
        Self {
            source,
            destination,
            resizer,
        }
    }

    /// Runs the loop, writing `{index} / {total}` to `progress` after every
    /// frame. Both streams are released when this returns, on every path.
    pub fn run<W: Write>(mut self, progress: &mut W) -> Result<u64, ResizeError> {
        let total = self.source.total_frames();
        let mut decoded = frame::Video::empty();
        let mut resized = frame::Video::empty();
        let mut index: u64 = 0;

        info!(
            input = ?self.source.path(),
            output = ?self.destination.path(),
            total,
            "Starting frame processing loop"
        );

        while self.source.read_frame(&mut decoded)? {
            self.resizer.resize(&decoded, &mut resized)?;
            self.destination.write_frame(&mut resized)?;

            index += 1;
            writeln!(progress, "{index} / {total}").context("Failed to report progress")?;
        }

        let frames = self.destination.finish()?;
        debug!(frames, "Frame processing loop finished");
        Ok(frames)
    }
}
