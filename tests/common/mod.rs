#![allow(dead_code)]

use ffmpeg_next::format::Pixel;
use ffmpeg_next::{Rational, codec, frame};
use std::path::Path;
use video_resize::{DestinationStream, VideoSettings};

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 48;
pub const FRAMES: usize = 5;

/// Brightness of the flat gray frame at `index`, increasing with the index
pub fn luma_for(index: usize) -> u8 {
    40 + (index as u8) * 40
}

/// Writes `frames` flat gray 64x48 MPEG-4 frames at 25 fps to `path`.
pub fn write_test_video(path: &Path, frames: usize) {
    ffmpeg_next::init().unwrap();

    let settings = VideoSettings {
        codec: DestinationStream::encoder_for(None, codec::Id::MPEG4).unwrap(),
        width: WIDTH,
        height: HEIGHT,
        frame_rate: Rational::new(25, 1),
        pixel_format: Pixel::YUV420P,
    };
    let mut destination = DestinationStream::create(path, settings).unwrap();

    for index in 0..frames {
        let mut frame = frame::Video::new(Pixel::YUV420P, WIDTH, HEIGHT);
        frame.data_mut(0).fill(luma_for(index));
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        destination.write_frame(&mut frame).unwrap();
    }

    assert_eq!(destination.finish().unwrap(), frames as u64);
}

/// Average of the visible luma samples of a planar YUV frame
pub fn mean_luma(frame: &frame::Video) -> f64 {
    let stride = frame.stride(0);
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let data = frame.data(0);

    let sum: u64 = (0..height)
        .flat_map(|row| &data[row * stride..row * stride + width])
        .map(|&sample| u64::from(sample))
        .sum();
    sum as f64 / (width * height) as f64
}
