use ffmpeg_next::util::log::{self as ffmpeg_log, Level as FfmpegLevel};
use std::ffi::OsString;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use video_resize::{Config, Invocation, program_name, usage};

fn init_tracing() {
    // Quiet by default so stdout/stderr carry only progress and errors.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<OsString> = std::env::args_os().collect();
    let program = program_name(&args);

    let config = match Config::load(args) {
        Ok(Invocation::Help(text)) => {
            eprintln!("{text}");
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Version(text)) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Run(config)) => config,
        Err(error) => {
            if error.wants_usage() {
                eprintln!("{}", usage(&program));
            }
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    ffmpeg_log::set_level(FfmpegLevel::Error);

    match video_resize::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
