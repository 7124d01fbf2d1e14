use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::core::{SegmentPolicy, DEFAULT_BUFFER_FRAMES};

pub const FRAMES_DIR_ENV: &str = "VOSPREP_FRAMES_DIR";
pub const MASKS_DIR_ENV: &str = "VOSPREP_MASKS_DIR";

/// VOS dataset convention, relative to the working directory
pub const DEFAULT_FRAMES_DIR: &str = "JPEGImages";
pub const DEFAULT_MASKS_DIR: &str = "Annotations";

/// Everything one export run needs.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub video_path: PathBuf,
    pub annotation_path: PathBuf,
    pub meta_path: PathBuf,
    pub frames_dir: PathBuf,
    pub masks_dir: PathBuf,
    pub buffer_frames: usize,
    /// Optional `key_id_map.json` overriding object ids
    pub key_id_map: Option<PathBuf>,
    /// Prefix of every segment directory
    pub video_name: String,
    pub policy: SegmentPolicy,
    /// Abort on the first I/O failure instead of skipping the segment
    pub fail_fast: bool,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
}

impl ExportConfig {
    /// Config with default output dirs and options; `video_name` is the
    /// video's file stem.
    pub fn new(
        video_path: impl Into<PathBuf>,
        annotation_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
    ) -> Self {
        let video_path = video_path.into();
        let video_name = video_name_of(&video_path);
        Self {
            video_path,
            annotation_path: annotation_path.into(),
            meta_path: meta_path.into(),
            frames_dir: PathBuf::from(DEFAULT_FRAMES_DIR),
            masks_dir: PathBuf::from(DEFAULT_MASKS_DIR),
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            key_id_map: None,
            video_name,
            policy: SegmentPolicy::Separate,
            fail_fast: false,
            dry_run: false,
            report_path: None,
        }
    }

    /// Create ExportConfig from CLI arguments and environment variables
    ///
    /// Output dirs priority: CLI args → ENV var (VOSPREP_FRAMES_DIR /
    /// VOSPREP_MASKS_DIR) → `JPEGImages` / `Annotations`
    pub fn from_env_and_cli(args: &Args) -> Self {
        Self::resolve(args, |key| std::env::var_os(key).map(PathBuf::from))
    }

    fn resolve(args: &Args, env: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let mut config = Self::new(&args.video, &args.annotation, &args.meta);

        if let Some(dir) = args.frames_dir.clone().or_else(|| env(FRAMES_DIR_ENV)) {
            config.frames_dir = dir;
        }
        if let Some(dir) = args.masks_dir.clone().or_else(|| env(MASKS_DIR_ENV)) {
            config.masks_dir = dir;
        }
        if let Some(name) = &args.video_name {
            config.video_name = name.clone();
        }

        config.buffer_frames = args.buffer_frames;
        config.key_id_map = args.key_id_map.clone();
        config.policy = if args.merge_segments {
            SegmentPolicy::Merge
        } else {
            SegmentPolicy::Separate
        };
        config.fail_fast = args.fail_fast;
        config.dry_run = args.dry_run;
        config.report_path = args.report.clone();
        config
    }
}

/// File stem of the video, `video` if it has none.
pub fn video_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "video".to_string())
}

/// Get path to a data file (logs, reports)
///
/// Platform paths:
/// - Linux: ~/.local/share/vosprep/{name}
/// - macOS: ~/Library/Application Support/vosprep/{name}
/// - Windows: %APPDATA%\vosprep\{name}
pub fn data_file(name: &str) -> PathBuf {
    get_data_dir().join(name)
}

fn get_data_dir() -> PathBuf {
    if let Some(dir) = dirs_next::data_dir() {
        return dir.join("vosprep");
    }

    // Fallback: "." if everything else fails
    PathBuf::from(".")
}
