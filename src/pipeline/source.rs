use crate::error::ResizeError;
use crate::utils::{frame_count, get_valid_frame_rate, threading_config};
use anyhow::Context as _;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::util::error::EAGAIN;
use ffmpeg_next::{Packet, Rational, codec, format, frame, media, threading};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Decoding side of the pipeline: the best video stream of an input file.
///
/// The demuxer and decoder are released when the value is dropped.
pub struct SourceStream {
    path: PathBuf,
    input: format::context::Input,
    decoder: codec::decoder::Video,
    stream_index: usize,
    frame_rate: Rational,
    total_frames: u64,
    eof_sent: bool,
}

impl SourceStream {
    pub fn open(path: &Path) -> Result<Self, ResizeError> {
        let input = format::input(path)
            .map_err(|e| ResizeError::source_open(format!("{}: {e}", path.display())))?;

        let (stream_index, frame_rate, total_frames, parameters) = {
            let stream = input
                .streams()
                .best(media::Type::Video)
                .ok_or_else(|| ResizeError::source_open("Can not find input video stream"))?;
            let frame_rate = get_valid_frame_rate(&stream).map_err(ResizeError::source_open)?;
            let total_frames = frame_count(stream.frames(), input.duration(), frame_rate);
            (stream.index(), frame_rate, total_frames, stream.parameters())
        };

        let mut context = codec::context::Context::from_parameters(parameters)
            .map_err(|e| ResizeError::source_open(format!("Video Decoder: {e}")))?;
        context.set_threading(threading_config(threading::Type::Frame));
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| ResizeError::source_open(format!("Video Decoder: {e}")))?;

        debug!(
            ?path,
            codec = ?decoder.id(),
            width = decoder.width(),
            height = decoder.height(),
            format = ?decoder.format(),
            fps = ?frame_rate,
            total_frames,
            "Opened source stream"
        );

        Ok(Self {
            path: path.to_path_buf(),
            input,
            decoder,
            stream_index,
            frame_rate,
            total_frames,
            eof_sent: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    /// Frame count from the container, estimated from its duration when
    /// not recorded, zero when neither is known.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn codec_id(&self) -> codec::Id {
        self.decoder.id()
    }

    pub fn format(&self) -> Pixel {
        self.decoder.format()
    }

    /// Decodes the next frame into `frame`.
    ///
    /// Returns `Ok(false)` once the decoder is fully drained, which is the
    /// only way the stream ends.
    pub fn read_frame(&mut self, frame: &mut frame::Video) -> anyhow::Result<bool> {
        loop {
            match self.decoder.receive_frame(frame) {
                Ok(()) => return Ok(true),
                Err(ffmpeg_next::Error::Eof) => {
                    debug!(path = ?self.path, "Video decoder fully flushed (EOF received).");
                    return Ok(false);
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => {
                    if self.eof_sent {
                        return Ok(false);
                    }
                    self.feed_decoder()?;
                }
                Err(e) => return Err(e).context("Video Decoder: Error receiving frame"),
            }
        }
    }

    /// Sends the next packet of our stream to the decoder, or EOF when the
    /// demuxer is exhausted.
    fn feed_decoder(&mut self) -> anyhow::Result<()> {
        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) if packet.stream() == self.stream_index => {
                    trace!(pts = ?packet.pts(), size = packet.size(), "Video packet FROM DEMUXER");
                    return self
                        .decoder
                        .send_packet(&packet)
                        .context("Video Decoder: Error sending packet");
                }
                Ok(()) => continue,
                Err(ffmpeg_next::Error::Eof) => {
                    debug!(path = ?self.path, "Sending EOF to video decoder...");
                    self.eof_sent = true;
                    return self
                        .decoder
                        .send_eof()
                        .context("Video Decoder: Error sending EOF");
                }
                Err(e) => return Err(e).context("Input: Error reading packet"),
            }
        }
    }
}
