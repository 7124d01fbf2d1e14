//! Dataset layout on disk and image persistence.
//!
//! ```text
//! <frames_base>/<video>_segment_<id>_frames_<s>-<e>/00000.jpg
//! <masks_base>/<video>_segment_<id>_frames_<s>-<e>/00000.png
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageError, ImageResult, RgbImage};

use super::error::ExportError;
use super::segments::Segment;

pub const JPEG_QUALITY: u8 = 95;

/// Zero-padded 5-digit stem for a re-based frame index.
pub fn frame_stem(rebased: usize) -> String {
    format!("{:05}", rebased)
}

/// `<video>_segment_<id>_frames_<s>-<e>`
pub fn segment_dir_name(video_name: &str, segment: &Segment) -> String {
    format!(
        "{}_segment_{}_frames_{}-{}",
        video_name, segment.id, segment.start, segment.end
    )
}

/// Frame and mask directories of one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDirs {
    pub frames: PathBuf,
    pub masks: PathBuf,
}

impl SegmentDirs {
    pub fn new(frames_base: &Path, masks_base: &Path, video_name: &str, segment: &Segment) -> Self {
        let name = segment_dir_name(video_name, segment);
        Self {
            frames: frames_base.join(&name),
            masks: masks_base.join(&name),
        }
    }

    /// Create both directories (and parents) if missing.
    pub fn create(&self, segment_id: usize) -> Result<(), ExportError> {
        for dir in [&self.frames, &self.masks] {
            std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
                segment_id,
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Failed image write
#[derive(Debug)]
pub struct WriteError {
    pub path: PathBuf,
    pub source: image::ImageError,
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to write {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Destination of one segment's frame/mask pairs.
pub trait FrameSink {
    /// Lossy frame image under `stem`.
    fn write_frame(&mut self, stem: &str, frame: &RgbImage) -> Result<(), WriteError>;
    /// Lossless mask image under `stem`.
    fn write_mask(&mut self, stem: &str, mask: &RgbImage) -> Result<(), WriteError>;
}

/// Writes `<stem>.jpg` frames and `<stem>.png` masks into [`SegmentDirs`].
pub struct DirSink<'a> {
    dirs: &'a SegmentDirs,
}

impl<'a> DirSink<'a> {
    pub fn new(dirs: &'a SegmentDirs) -> Self {
        Self { dirs }
    }
}

impl FrameSink for DirSink<'_> {
    fn write_frame(&mut self, stem: &str, frame: &RgbImage) -> Result<(), WriteError> {
        let path = self.dirs.frames.join(format!("{}.jpg", stem));
        write_encoded(path, |w| {
            JpegEncoder::new_with_quality(w, JPEG_QUALITY).encode_image(frame)
        })
    }

    fn write_mask(&mut self, stem: &str, mask: &RgbImage) -> Result<(), WriteError> {
        let path = self.dirs.masks.join(format!("{}.png", stem));
        write_encoded(path, |w| mask.write_with_encoder(PngEncoder::new(w)))
    }
}

/// Encode into a buffered file and flush it, so a failing final write
/// (e.g. a full disk) surfaces as an error instead of being lost on drop.
fn write_encoded(
    path: PathBuf,
    encode: impl FnOnce(&mut BufWriter<File>) -> ImageResult<()>,
) -> Result<(), WriteError> {
    let result = File::create(&path)
        .map_err(ImageError::IoError)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            encode(&mut writer)?;
            writer.flush().map_err(ImageError::IoError)
        });
    result.map_err(|source| WriteError { path, source })
}
