use std::sync::LazyLock;

use anyhow::anyhow;
use ffmpeg_next::{Rational, threading};
use tracing::{debug, info};

/// Upper bound on codec worker threads
const MAX_THREADS: usize = 16;

static NUM_CPUS: LazyLock<usize> = LazyLock::new(|| {
    let num = num_cpus::get().min(MAX_THREADS);
    info!(num, "Detecting CPU cores");
    num
});

/// Codec threading of the given kind over all detected cores
pub(crate) fn threading_config(kind: threading::Type) -> threading::Config {
    threading::Config {
        kind,
        count: *NUM_CPUS,
        ..Default::default()
    }
}

// Helper function: checks if a Rational is valid (numerator and denominator are both > 0)
pub(crate) fn is_rational_valid(r: Rational) -> bool {
    r.numerator() > 0 && r.denominator() > 0
}

/// Gets a valid frame rate from the input video stream.
pub(crate) fn get_valid_frame_rate(in_video_stream: &ffmpeg_next::Stream) -> anyhow::Result<Rational> {
    let avg_fps = in_video_stream.avg_frame_rate();
    debug!(
        "Frame Rate Acquisition: Input stream avg_frame_rate: {}/{}",
        avg_fps.numerator(),
        avg_fps.denominator()
    );
    if is_rational_valid(avg_fps) {
        return Ok(avg_fps);
    }

    // r_frame_rate
    let r_fps = in_video_stream.rate();
    debug!(
        "Frame Rate Acquisition: Input stream r_frame_rate: {}/{}",
        r_fps.numerator(),
        r_fps.denominator()
    );
    if is_rational_valid(r_fps) {
        return Ok(r_fps);
    }

    Err(anyhow!(
        "Unable to determine a valid frame rate. avg_frame_rate: {}/{}, r_frame_rate: {}/{}",
        avg_fps.numerator(),
        avg_fps.denominator(),
        r_fps.numerator(),
        r_fps.denominator()
    ))
}

/// Frame count recorded by the container, or an estimate from the
/// container duration (microseconds) and frame rate. Zero when unknown.
pub(crate) fn frame_count(recorded: i64, duration_us: i64, frame_rate: Rational) -> u64 {
    if recorded > 0 {
        return recorded as u64;
    }
    if duration_us <= 0 || !is_rational_valid(frame_rate) {
        return 0;
    }
    let estimate = duration_us as f64 / 1_000_000.0 * f64::from(frame_rate);
    estimate.round() as u64
}

/// `(floor(width * scale), floor(height * scale))`
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_axis = |size: u32| (f64::from(size) * scale).floor() as u32;
    (scale_axis(width), scale_axis(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(640, 480, 2.0), (1280, 960));
        assert_eq!(scaled_dimensions(640, 480, 0.5), (320, 240));
        assert_eq!(scaled_dimensions(101, 75, 0.5), (50, 37));
        assert_eq!(scaled_dimensions(3, 3, 1.5), (4, 4));
        assert_eq!(scaled_dimensions(10, 10, 0.01), (0, 0));
    }

    #[quickcheck]
    fn scaled_dimensions_floor_both_axes(width: u16, height: u16, scale_milli: u16) -> bool {
        let scale = f64::from(scale_milli.max(1)) / 1000.0;
        let (w, h) = scaled_dimensions(u32::from(width), u32::from(height), scale);
        w == (f64::from(width) * scale).floor() as u32 && h == (f64::from(height) * scale).floor() as u32
    }

    #[quickcheck]
    fn doubling_is_exact(width: u16, height: u16) -> bool {
        let (w, h) = scaled_dimensions(u32::from(width), u32::from(height), 2.0);
        w == u32::from(width) * 2 && h == u32::from(height) * 2
    }

    #[test]
    fn test_rational_validity() {
        assert!(is_rational_valid(Rational::new(30000, 1001)));
        assert!(!is_rational_valid(Rational::new(0, 1)));
        assert!(!is_rational_valid(Rational::new(25, 0)));
    }

    #[test]
    fn test_frame_count_prefers_container_value() {
        assert_eq!(frame_count(120, 10_000_000, Rational::new(25, 1)), 120);
    }

    #[test]
    fn test_frame_count_estimated_from_duration() {
        assert_eq!(frame_count(0, 4_000_000, Rational::new(25, 1)), 100);
        assert_eq!(frame_count(0, 1_001_000, Rational::new(30000, 1001)), 30);
    }

    #[test]
    fn test_frame_count_unknown() {
        assert_eq!(frame_count(0, 0, Rational::new(25, 1)), 0);
        assert_eq!(frame_count(0, 4_000_000, Rational::new(0, 1)), 0);
    }
}
