use std::{
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record};
use meanframe::{
    FfmpegLogLevel, OperationType, PixelFormat, ProgressCallback, ProgressInfo, RunOptions,
    RunSummary, VideoFile,
    configuration::{
        DEFAULT_FRAME_SKIPS, DEFAULT_IMAGE_EXTENSION, DEFAULT_INPUT_DIR, DEFAULT_KEYFRAMES_DIR,
        DEFAULT_OUTPUT_DIR, DEFAULT_VIDEO_EXTENSIONS,
    },
    expected_sample_count,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  meanframe run\n  meanframe run --input clips --output means --frame-skip 0,9,99 --progress\n  meanframe run --write-keyframes --image-ext png --pixel-format gray\n  meanframe probe clips/street.mp4 --frame-skip 9 --json\n  meanframe completions zsh > _meanframe";

#[derive(Debug, Parser)]
#[command(
    name = "meanframe",
    version,
    about = "Average video frames into a single mean image",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true, default_value = "error")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute mean images for every video in the input directory.
    #[command(
        about = "Compute mean images",
        after_help = "Examples:\n  meanframe run --frame-skip 0,49,999\n  meanframe run --ext .mp4 --ext .webm --json"
    )]
    Run {
        /// Directory scanned for videos (not recursive).
        #[arg(long, default_value = DEFAULT_INPUT_DIR)]
        input: PathBuf,
        /// Directory receiving mean images. Cleared at start.
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// Parent directory of per-video keyframe folders.
        #[arg(long, default_value = DEFAULT_KEYFRAMES_DIR)]
        keyframes_dir: PathBuf,
        /// Frames skipped between samples; one mean image per value.
        #[arg(long = "frame-skip", value_delimiter = ',', default_values_t = DEFAULT_FRAME_SKIPS.to_vec())]
        frame_skips: Vec<u64>,
        /// Also save every sampled frame.
        #[arg(long)]
        write_keyframes: bool,
        /// Accepted video filename suffixes.
        #[arg(
            long = "ext",
            value_delimiter = ',',
            default_values_t = DEFAULT_VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect::<Vec<_>>()
        )]
        extensions: Vec<String>,
        /// Output image extension (jpg, png, bmp, tiff, ...).
        #[arg(long, default_value = DEFAULT_IMAGE_EXTENSION)]
        image_ext: String,
        /// Pixel format frames are averaged in (rgb8, rgba8, gray8).
        #[arg(long, default_value = "rgb8")]
        pixel_format: String,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print video metadata and expected sample counts.
    #[command(about = "Inspect a video", visible_alias = "info")]
    Probe {
        /// Video file.
        input: PathBuf,
        /// Frame skips to report sample counts for.
        #[arg(long = "frame-skip", value_delimiter = ',', default_values_t = DEFAULT_FRAME_SKIPS.to_vec())]
        frame_skips: Vec<u64>,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Writes `log` records from this crate to stderr with a coloured level tag.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("meanframe")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error".red().bold(),
            Level::Warn => "warning".yellow().bold(),
            Level::Info => "info".cyan().bold(),
            Level::Debug => "debug".blue(),
            Level::Trace => "trace".dimmed(),
        };
        eprintln!("{tag}: {}", record.args());
    }

    fn flush(&self) {
        std::io::stderr().flush().ok();
    }
}

fn init_logger(global: &GlobalOptions) {
    let level = if global.verbose {
        LevelFilter::Debug
    } else if global.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logger(global);
    let level: FfmpegLogLevel = global.log_level.parse()?;
    meanframe::set_ffmpeg_log_level(level);
    Ok(())
}

/// Accept `mp4` as well as `.mp4` for a video suffix.
fn normalize_video_extension(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}

struct TerminalProgress {
    bar: ProgressBar,
    /// (video, frame skip) of the job the bar currently shows.
    job: Mutex<Option<(PathBuf, u64)>>,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self {
            bar,
            job: Mutex::new(None),
        })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        {
            let mut job = self.job.lock().unwrap_or_else(|e| e.into_inner());
            let current = (info.video.clone(), info.stride);
            if job.as_ref() != Some(&current) {
                self.bar.reset();
                *job = Some(current);
            }
        }
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);

        let name = info
            .video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let period = u128::from(info.stride) + 1;
        match info.operation {
            OperationType::ImageExport => {
                self.bar.set_message(format!("{name}@{period} writing"));
            }
            _ => {
                self.bar
                    .set_message(format!("{name}@{period} ({} sampled)", info.samples));
            }
        }
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    json!({
        "videos": summary.videos.iter().map(|video| video.display().to_string()).collect::<Vec<_>>(),
        "succeeded": summary.succeeded(),
        "failed": summary.failed(),
        "jobs": summary.outcomes.iter().map(|outcome| match &outcome.result {
            Ok(report) => json!({
                "video": outcome.video.display().to_string(),
                "frame_skip": outcome.stride,
                "ok": true,
                "total_frames": report.total_frames,
                "sample_count": report.sample_count,
                "shape": [
                    report.frame_shape.height,
                    report.frame_shape.width,
                    report.frame_shape.channels,
                ],
                "output": report.output.display().to_string(),
                "keyframes_written": report.keyframes_written,
            }),
            Err(error) => json!({
                "video": outcome.video.display().to_string(),
                "frame_skip": outcome.stride,
                "ok": false,
                "error": error.to_string(),
            }),
        }).collect::<Vec<_>>(),
    })
}

fn print_summary(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "{} {} @ frame skip {}: {} of {} frames -> {}",
                "ok".green().bold(),
                outcome.video.display(),
                outcome.stride,
                report.sample_count,
                report.total_frames,
                report.output.display(),
            ),
            Err(error) => println!(
                "{} {} @ frame skip {}: {error}",
                "failed".red().bold(),
                outcome.video.display(),
                outcome.stride,
            ),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Run {
            input,
            output,
            keyframes_dir,
            frame_skips,
            write_keyframes,
            extensions,
            image_ext,
            pixel_format,
            progress,
            json,
        } => {
            let pixel_format: PixelFormat = pixel_format.parse()?;
            let mut options = RunOptions::new()
                .with_input_dir(input)
                .with_output_dir(output)
                .with_keyframes_dir(keyframes_dir)
                .with_frame_skips(frame_skips)
                .with_write_keyframes(write_keyframes)
                .with_supported_extensions(
                    extensions.iter().map(|ext| normalize_video_extension(ext)),
                )
                .with_image_extension(image_ext)
                .with_pixel_format(pixel_format);

            let terminal_progress = if progress {
                let callback = Arc::new(TerminalProgress::new()?);
                options = options
                    .with_progress(callback.clone())
                    .with_batch_size(10);
                Some(callback)
            } else {
                None
            };

            let summary = meanframe::run(&options)?;
            drop(options);
            drop(terminal_progress);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
            } else {
                print_summary(&summary);
            }

            if summary.failed() > 0 {
                return Err(format!(
                    "{} of {} job(s) failed",
                    summary.failed(),
                    summary.outcomes.len()
                )
                .into());
            }
            if !json {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Wrote {} mean image(s)", summary.succeeded()).green()
                );
            }
        }
        Commands::Probe {
            input,
            frame_skips,
            json,
        } => {
            let video = VideoFile::open(&input)?;
            let metadata = video.metadata();
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "frame_count": metadata.frame_count,
                    "samples": frame_skips.iter().map(|&skip| json!({
                        "frame_skip": skip,
                        "expected_samples": expected_sample_count(metadata.frame_count, skip),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!("Frames (estimated): {}", metadata.frame_count);
                for skip in frame_skips {
                    println!(
                        "Frame skip {skip}: ~{} sample(s)",
                        expected_sample_count(metadata.frame_count, skip)
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "meanframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
