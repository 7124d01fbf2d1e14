use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info};

use vosprep::cli::Args;
use vosprep::config::{self, ExportConfig};
use vosprep::core::Pipeline;

fn main() -> Result<()> {
    // Initialize FFmpeg
    playa_ffmpeg::init().context("Failed to initialize FFmpeg")?;

    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();
    init_logging(&args)?;

    info!("vosprep {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    let config = ExportConfig::from_env_and_cli(&args);
    info!(
        "Output: frames -> {}, masks -> {} (video name: {})",
        config.frames_dir.display(),
        config.masks_dir.display(),
        config.video_name
    );

    let report = Pipeline::new(config).run()?;

    for seg in &report.segments {
        let status = match (&seg.error, report.dry_run, seg.truncated) {
            (Some(e), _, _) => format!("FAILED: {}", e),
            (None, true, _) => format!("{} frames (dry-run)", seg.segment.len()),
            (None, false, true) => format!("{} frames (truncated)", seg.frames_written),
            (None, false, false) => format!("{} frames", seg.frames_written),
        };
        println!(
            "segment {:>3}  frames {:>6}-{:<6}  {}",
            seg.segment.id, seg.segment.start, seg.segment.end, status
        );
    }
    println!(
        "{}: {} segments, {} frames written",
        report.video_name,
        report.segments.len(),
        report.frames_written()
    );

    if report.failed() > 0 {
        bail!("{} of {} segments failed", report.failed(), report.segments.len());
    }
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        // File logging with specified verbosity level
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file("vosprep.log"));

        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!(
            "Logging to file: {} (level: {:?})",
            log_path.display(),
            log_level
        );
    } else {
        // Console logging with specified verbosity level (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}
