use crate::error::{PathRole, ResizeError};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_PROGRAM: &str = "video-resize";

/// Long flags that may also be spelled with a single dash (`-scale=2.0`)
const SINGLE_DASH_FLAGS: [&str; 8] = [
    "scale", "saveDir", "save-dir", "codec", "config", "help", "usage", "version",
];

/// Command line, optionally completed by a config file.
///
/// Example configuration file content
/// # Video Resize Configuration
///
/// scale = 0.5
/// save_dir = "/home/homura/videos"
/// codec = "mpeg4"  # Optional: encoder used instead of the source codec
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[serde(default)]
#[command(version, about, long_about = None, disable_help_flag = true)]
pub struct Config {
    /// File path to the input movie file
    #[arg(value_name = "videoPath")]
    #[serde(skip)]
    pub video_path: Option<PathBuf>,

    /// Scale factor of resizing
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Path to the directory where the result will be saved (default: current directory)
    #[arg(long = "saveDir", visible_alias = "save-dir", value_name = "SAVEDIR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,

    /// Encoder used instead of the source codec, e.g. mpeg4 or mjpeg
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,

    /// Configuration file with defaults for scale, save_dir and codec
    #[arg(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Print help
    #[arg(short = 'h', long = "help", visible_alias = "usage", action = ArgAction::SetTrue)]
    #[serde(skip)]
    pub help: bool,
}

/// Validated, immutable settings of one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub video_path: PathBuf,
    pub scale: f64,
    pub save_dir: PathBuf,
    pub codec: Option<String>,
}

/// What the command line asked for
#[derive(Debug)]
pub enum Invocation {
    Help(String),
    Version(String),
    Run(RunConfig),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_path: None,
            scale: default_scale(),
            save_dir: None,
            codec: None,
            config: None,
            help: false,
        }
    }
}

impl Config {
    /// Parse `args` (program name first), merge the config file if one is
    /// given, and validate the result.
    pub fn load<I, T>(args: I) -> Result<Invocation, ResizeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = normalize_args(args);
        let program = program_name(&args);

        // Help wins over anything else on the line, valid or not
        if args.iter().skip(1).any(|arg| is_help_flag(arg)) {
            return Ok(Invocation::Help(usage(&program)));
        }

        let mut config = match Config::try_parse_from(&args) {
            Ok(config) => config,
            Err(error) if error.kind() == ClapErrorKind::DisplayVersion => {
                return Ok(Invocation::Version(error.to_string()));
            }
            Err(error) => return Err(ResizeError::InvalidArguments(clap_message(&error))),
        };

        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(config_path)?;
            config = config.merge_with_file(file_config);
        }

        config.resolve().map(Invocation::Run)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ResizeError> {
        let content = std::fs::read_to_string(path).map_err(|error| {
            ResizeError::InvalidArguments(format!(
                "cannot read config file {}: {error}",
                path.display()
            ))
        })?;
        let config: Config = toml::from_str(&content).map_err(|error| {
            ResizeError::InvalidArguments(format!(
                "malformed config file {}: {}",
                path.display(),
                error.message()
            ))
        })?;
        debug!(?path, ?config, "Loaded config file");
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        if self.scale == default_scale() {
            self.scale = file_config.scale;
        }
        if self.save_dir.is_none() {
            self.save_dir = file_config.save_dir;
        }
        if self.codec.is_none() {
            self.codec = file_config.codec;
        }
        self
    }

    /// Check the arguments in the order they are reported to the user:
    /// positional present, video exists, scale valid, save directory exists.
    pub fn resolve(self) -> Result<RunConfig, ResizeError> {
        let video_path = self.video_path.ok_or_else(|| {
            ResizeError::InvalidArguments("missing required argument <videoPath>".to_string())
        })?;
        if !video_path.exists() {
            return Err(ResizeError::PathNotFound {
                role: PathRole::Video,
                path: video_path,
            });
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ResizeError::InvalidScale(self.scale));
        }

        let save_dir = match self.save_dir {
            Some(save_dir) => save_dir,
            None => std::env::current_dir().map_err(|error| {
                ResizeError::InvalidArguments(format!("cannot read current directory: {error}"))
            })?,
        };
        if !save_dir.is_dir() {
            return Err(ResizeError::PathNotFound {
                role: PathRole::SaveDir,
                path: save_dir,
            });
        }

        let codec = self.codec.filter(|codec| !codec.is_empty());

        Ok(RunConfig {
            video_path,
            scale: self.scale,
            save_dir,
            codec,
        })
    }
}

/// Usage text, with `program` shown as the executable name
pub fn usage(program: &str) -> String {
    Config::command()
        .bin_name(program.to_string())
        .override_usage(format!(
            "{program} <videoPath> [-scale=SCALE] [-saveDir=SAVEDIR]"
        ))
        .after_help(format!(
            "Example:\n    {program} /home/madoka/video1.avi -scale=2.0 -saveDir=/home/homura/"
        ))
        .render_help()
        .to_string()
}

/// Rewrites `-scale=2` style flags into the `--scale=2` form clap expects.
/// The program name (first element) is left untouched.
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(index, arg)| if index == 0 { arg } else { normalize_arg(arg) })
        .collect()
}

fn normalize_arg(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    if let Some(rest) = text.strip_prefix('-') {
        if !rest.starts_with('-') {
            let name = rest.split('=').next().unwrap_or(rest);
            if SINGLE_DASH_FLAGS.contains(&name) {
                return OsString::from(format!("-{text}"));
            }
        }
    }
    arg
}

fn is_help_flag(arg: &OsString) -> bool {
    matches!(arg.to_str(), Some("-h" | "--help" | "--usage"))
}

/// Base name of the executable in `args[0]`
pub fn program_name(args: &[OsString]) -> String {
    args.first()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string())
}

fn clap_message(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let first_line = rendered.lines().next().unwrap_or_default();
    first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string()
}

// Default value functions
fn default_scale() -> f64 {
    2.0
}
