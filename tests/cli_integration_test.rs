mod common;

use assert_cmd::Command;
use common::{FRAMES, HEIGHT, WIDTH, write_test_video};
use predicates::str::{contains, starts_with};
use std::error::Error;
use std::path::Path;
use tempfile::tempdir;

fn resize_cmd() -> Command {
    Command::cargo_bin("video-resize").expect("Failed to find video-resize binary")
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_help_flags_exit_zero_without_output() -> Result<(), Box<dyn Error>> {
    for flag in ["-h", "-help", "-usage", "--help"] {
        let work_dir = tempdir()?;

        resize_cmd()
            .current_dir(work_dir.path())
            .arg(flag)
            .assert()
            .success()
            .stderr(contains("<videoPath> [-scale=SCALE] [-saveDir=SAVEDIR]"))
            .stderr(contains("Example:"));

        assert_eq!(entries(work_dir.path()), 0, "{flag} created a file");
    }
    Ok(())
}

#[test]
fn test_help_with_a_video_does_not_convert() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = work_dir.path().join("video1.avi");
    write_test_video(&input, 2);

    resize_cmd()
        .current_dir(work_dir.path())
        .arg(&input)
        .arg("-h")
        .assert()
        .success()
        .stdout("");

    assert_eq!(entries(work_dir.path()), 1);
    Ok(())
}

#[test]
fn test_missing_video_path_prints_usage() {
    resize_cmd()
        .assert()
        .code(1)
        .stderr(contains("Usage:"))
        .stderr(contains("missing required argument <videoPath>"));
}

#[test]
fn test_non_existent_input() -> Result<(), Box<dyn Error>> {
    let save_dir = tempdir()?;

    resize_cmd()
        .arg("surely/this/does/not/exist/video.avi")
        .arg(format!("-saveDir={}", save_dir.path().display()))
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("Video path does not exist"));

    assert_eq!(entries(save_dir.path()), 0);
    Ok(())
}

#[test]
fn test_non_positive_scale() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = work_dir.path().join("dummy.avi");
    std::fs::write(&input, "dummy content")?;

    for scale in ["0", "-1.5"] {
        resize_cmd()
            .current_dir(work_dir.path())
            .arg(&input)
            .arg(format!("-scale={scale}"))
            .assert()
            .code(1)
            .stdout("")
            .stderr(contains("Invalid scale value"));
    }

    assert_eq!(entries(work_dir.path()), 1);
    Ok(())
}

#[test]
fn test_non_existent_save_dir() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = work_dir.path().join("dummy.avi");
    std::fs::write(&input, "dummy content")?;

    resize_cmd()
        .arg(&input)
        .arg("-saveDir=/surely/this/does/not/exist")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("Save path does not exist"));
    Ok(())
}

#[test]
fn test_unparsable_scale() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = work_dir.path().join("dummy.avi");
    std::fs::write(&input, "dummy content")?;

    resize_cmd()
        .arg(&input)
        .arg("-scale=twice")
        .assert()
        .code(1)
        .stderr(contains("Invalid arguments"));
    Ok(())
}

#[test]
fn test_unopenable_video() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = work_dir.path().join("dummy.avi");
    std::fs::write(&input, "dummy content")?;

    resize_cmd()
        .current_dir(work_dir.path())
        .arg(&input)
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("Video file could not be opened"));

    assert_eq!(entries(work_dir.path()), 1);
    Ok(())
}

#[test]
fn test_version() {
    resize_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_resize_into_save_dir() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = work_dir.path().join("video1.avi");
    write_test_video(&input, FRAMES);
    let save_dir = work_dir.path().join("out");
    std::fs::create_dir(&save_dir)?;

    resize_cmd()
        .arg(&input)
        .arg("-scale=2.0")
        .arg(format!("-saveDir={}", save_dir.display()))
        .assert()
        .success()
        .stdout(starts_with(format!("{WIDTH} , {HEIGHT}\n1 / ")))
        .stdout(contains(format!("\n{FRAMES} / ")));

    let outputs: Vec<_> = std::fs::read_dir(&save_dir)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].starts_with("video1-"));
    assert!(outputs[0].ends_with(".avi"));
    Ok(())
}

#[test]
fn test_resize_defaults_to_working_directory() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input = input_dir.path().join("clip.avi");
    write_test_video(&input, 2);
    let work_dir = tempdir()?;

    resize_cmd()
        .current_dir(work_dir.path())
        .arg(&input)
        .arg("--scale")
        .arg("0.5")
        .assert()
        .success()
        .stdout(contains("2 / "));

    assert_eq!(entries(work_dir.path()), 1);
    Ok(())
}
