use clap::Parser;
use std::path::PathBuf;

use crate::core::DEFAULT_BUFFER_FRAMES;

// Build version with backend info
const VERSION_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Video:  playa-ffmpeg 8.0 (static)"
);

/// Convert annotated video into VOS training segments (JPEG frames + PNG masks)
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Source video file
    #[arg(short = 'i', long = "video", value_name = "VIDEO")]
    pub video: PathBuf,

    /// Per-video annotation JSON
    #[arg(short = 'a', long = "annotation", value_name = "JSON")]
    pub annotation: PathBuf,

    /// Project meta JSON (class definitions)
    #[arg(short = 'm', long = "meta", value_name = "JSON")]
    pub meta: PathBuf,

    /// Frame output base directory (env: VOSPREP_FRAMES_DIR, default: JPEGImages)
    #[arg(long = "frames-dir", value_name = "DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Mask output base directory (env: VOSPREP_MASKS_DIR, default: Annotations)
    #[arg(long = "masks-dir", value_name = "DIR")]
    pub masks_dir: Option<PathBuf>,

    /// Unannotated context frames kept before and after each annotated run
    #[arg(short = 'b', long = "buffer-frames", value_name = "N", default_value_t = DEFAULT_BUFFER_FRAMES)]
    pub buffer_frames: usize,

    /// Object key → id map (key_id_map.json); overrides ids from the annotation
    #[arg(short = 'k', long = "key-id-map", value_name = "JSON")]
    pub key_id_map: Option<PathBuf>,

    /// Segment directory prefix (default: video file stem)
    #[arg(short = 'n', long = "video-name", value_name = "NAME")]
    pub video_name: Option<String>,

    /// Merge segments whose padded ranges overlap or touch
    #[arg(long = "merge-segments")]
    pub merge_segments: bool,

    /// Abort on the first write/decode failure instead of skipping the segment
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Find and print segments without decoding or writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write a JSON run report to this file
    #[arg(short = 'r', long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable debug logging to file (default: vosprep.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
