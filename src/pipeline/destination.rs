use crate::error::ResizeError;
use crate::utils::threading_config;
use anyhow::{Context as _, anyhow};
use ffmpeg_next::codec::encoder;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::util::error::EAGAIN;
use ffmpeg_next::{Codec, Dictionary, Packet, Rational, codec, format, frame, threading};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Encoder parameters of a [`DestinationStream`]
#[derive(Clone, Copy)]
pub struct VideoSettings {
    pub codec: Codec,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    /// Used when the encoder supports it, otherwise its first supported format
    pub pixel_format: Pixel,
}

/// Encoding side of the pipeline: a single video stream muxed into a file.
///
/// [`DestinationStream::finish`] flushes the encoder and writes the trailer.
/// A stream dropped without `finish` (an error path) is finalized
/// best-effort so the partial file on disk is still closed.
pub struct DestinationStream {
    path: PathBuf,
    output: format::context::Output,
    encoder: encoder::video::Encoder,
    stream_index: usize,
    time_base: Rational,
    width: u32,
    height: u32,
    format: Pixel,
    next_pts: i64,
    finished: bool,
}

impl DestinationStream {
    /// Finds the encoder for `name`, or the encoder of `source_codec` when
    /// no name is given.
    pub fn encoder_for(name: Option<&str>, source_codec: codec::Id) -> Result<Codec, ResizeError> {
        let codec = match name {
            Some(name) => encoder::find_by_name(name)
                .ok_or_else(|| ResizeError::destination_open(format!("Encoder '{name}' not found")))?,
            None => encoder::find(source_codec).ok_or_else(|| {
                ResizeError::destination_open(format!(
                    "No encoder for source codec {source_codec:?}. Please try another codec with --codec"
                ))
            })?,
        };
        if !codec.is_video() {
            return Err(ResizeError::destination_open(format!(
                "Encoder '{}' is not a video encoder",
                codec.name()
            )));
        }
        Ok(codec)
    }

    /// Creates the output file, opens the encoder and writes the container header.
    pub fn create(path: &Path, settings: VideoSettings) -> Result<Self, ResizeError> {
        let VideoSettings {
            codec,
            width,
            height,
            frame_rate,
            pixel_format,
        } = settings;
        debug!(?path, codec = codec.name(), width, height, ?frame_rate, "Creating destination stream");

        if width == 0 || height == 0 {
            return Err(ResizeError::destination_open(format!(
                "Invalid frame size {width}x{height}"
            )));
        }

        let mut output = format::output(path)
            .map_err(|e| ResizeError::destination_open(format!("{}: {e}", path.display())))?;
        let global_header = output
            .format()
            .flags()
            .contains(format::flag::Flags::GLOBAL_HEADER);

        let mut enc_config = codec::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| ResizeError::destination_open(format!("Failed to create encoder config: {e}")))?;

        if global_header {
            enc_config.set_flags(codec::Flags::GLOBAL_HEADER);
        }
        if codec.capabilities().contains(codec::Capabilities::SLICE_THREADS) {
            enc_config.set_threading(threading_config(threading::Type::Slice));
        }

        let format = pick_pixel_format(codec, pixel_format);
        enc_config.set_format(format);
        enc_config.set_width(width);
        enc_config.set_height(height);

        let time_base = frame_rate.invert();
        enc_config.set_time_base(time_base);
        enc_config.set_frame_rate(Some(frame_rate));

        let encoder = enc_config.open_with(Dictionary::new()).map_err(|e| {
            ResizeError::destination_open(format!(
                "Encoder '{}' rejected {width}x{height} {format:?} at {}/{} fps: {e}. Please try another codec.",
                codec.name(),
                frame_rate.numerator(),
                frame_rate.denominator(),
            ))
        })?;

        let stream_index = {
            let mut stream = output
                .add_stream(codec)
                .map_err(|e| ResizeError::destination_open(format!("Failed to add stream: {e}")))?;
            stream.set_parameters(&encoder);
            stream.set_time_base(time_base);
            stream.index()
        };

        output
            .write_header()
            .map_err(|e| ResizeError::destination_open(format!("Failed to write header: {e}")))?;
        debug!(?path, stream_index, ?format, "Output context header written successfully.");

        Ok(Self {
            path: path.to_path_buf(),
            output,
            encoder,
            stream_index,
            time_base,
            width,
            height,
            format,
            next_pts: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> Pixel {
        self.format
    }

    /// Frames accepted so far
    pub fn frames_written(&self) -> u64 {
        self.next_pts as u64
    }

    /// Encodes `frame` as the next frame of the stream.
    ///
    /// The frame must already have the stream's size and pixel format. Its
    /// timestamp is overwritten with its position in the stream.
    pub fn write_frame(&mut self, frame: &mut frame::Video) -> anyhow::Result<()> {
        frame.set_pts(Some(self.next_pts));
        self.encoder
            .send_frame(frame)
            .context("Encoder: Error sending frame")?;
        self.next_pts += 1;
        self.drain_packets()
    }

    /// Flushes the encoder and writes the trailer, returning the number of
    /// frames written.
    pub fn finish(mut self) -> anyhow::Result<u64> {
        self.finalize()?;
        Ok(self.frames_written())
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        debug!(path = ?self.path, "Sending EOF to video encoder...");
        self.encoder
            .send_eof()
            .context("Encoder: Error sending EOF")?;
        self.drain_packets()?;

        self.output
            .write_trailer()
            .context("Output: Failed to write trailer")?;
        debug!(path = ?self.path, frames = self.next_pts, "Output trailer written.");
        Ok(())
    }

    fn drain_packets(&mut self) -> anyhow::Result<()> {
        let mut packet = Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => self.write_packet(&mut packet)?,
                Err(ffmpeg_next::Error::Eof) => return Ok(()),
                Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => return Ok(()),
                Err(e) => return Err(e).context("Encoder: Error receiving packet"),
            }
        }
    }

    fn write_packet(&mut self, packet: &mut Packet) -> anyhow::Result<()> {
        let target_time_base = self
            .output
            .stream(self.stream_index)
            .ok_or_else(|| anyhow!("Failed to get output stream for index {}", self.stream_index))?
            .time_base();

        packet.set_stream(self.stream_index);
        packet.rescale_ts(self.time_base, target_time_base);
        trace!(
            pts = ?packet.pts(),
            dts = ?packet.dts(),
            ?target_time_base,
            "Video packet AFTER RESCALE_TS"
        );

        packet
            .write_interleaved(&mut self.output)
            .context("Output: Error writing interleaved video packet")
    }
}

impl Drop for DestinationStream {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(error) = self.finalize() {
            warn!(path = ?self.path, ?error, "Failed to finalize partial output");
        }
    }
}

/// `preferred` when the encoder accepts it, otherwise the encoder's first
/// supported format.
fn pick_pixel_format(codec: Codec, preferred: Pixel) -> Pixel {
    let supported: Vec<Pixel> = codec
        .video()
        .ok()
        .and_then(|video| video.formats())
        .map(Iterator::collect)
        .unwrap_or_default();

    if preferred != Pixel::None && (supported.is_empty() || supported.contains(&preferred)) {
        return preferred;
    }
    supported.first().copied().unwrap_or(Pixel::YUV420P)
}
