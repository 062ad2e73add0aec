//! FFmpeg console verbosity.
//!
//! FFmpeg logs to stderr on its own, independently of the Rust
//! [`log`](https://crates.io/crates/log) facade used by this crate. Decoding
//! long or slightly damaged videos can make it very chatty, so the level is
//! exposed here without requiring callers to depend on `ffmpeg-next`.
//!
//! ```no_run
//! use meanframe::FfmpegLogLevel;
//!
//! meanframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let level: FfmpegLogLevel = "warning".parse().unwrap();
//! assert_eq!(level, FfmpegLogLevel::Warning);
//! ```

use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg internal log level, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Unrecoverable errors that abort the process.
    Panic,
    /// Unrecoverable errors that invalidate the context.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Tracing output.
    Trace,
}

const LEVELS: [(FfmpegLogLevel, Level); 9] = [
    (FfmpegLogLevel::Quiet, Level::Quiet),
    (FfmpegLogLevel::Panic, Level::Panic),
    (FfmpegLogLevel::Fatal, Level::Fatal),
    (FfmpegLogLevel::Error, Level::Error),
    (FfmpegLogLevel::Warning, Level::Warning),
    (FfmpegLogLevel::Info, Level::Info),
    (FfmpegLogLevel::Verbose, Level::Verbose),
    (FfmpegLogLevel::Debug, Level::Debug),
    (FfmpegLogLevel::Trace, Level::Trace),
];

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(format!("unsupported FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's stderr verbosity. Does not affect `log` crate output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    if let Some((_, ffmpeg_level)) = LEVELS.iter().find(|(ours, _)| *ours == level) {
        ffmpeg_next::util::log::set_level(*ffmpeg_level);
    }
}

/// Current FFmpeg verbosity, if it maps to a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    let current = ffmpeg_next::util::log::get_level().ok()?;
    LEVELS
        .iter()
        .find(|(_, ffmpeg_level)| *ffmpeg_level == current)
        .map(|(ours, _)| *ours)
}
