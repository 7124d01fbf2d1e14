use std::path::PathBuf;

use uuid::Uuid;

use super::output::WriteError;
use crate::entities::VideoError;

/// Errors raised while exporting one segment.
///
/// Running out of frames is not an error: the segment is truncated.
#[derive(Debug)]
pub enum ExportError {
    /// A figure's object has no id or no color. The object mapping is out of
    /// sync with the document; continuing would mislabel masks.
    UnmappedObjectReference {
        segment_id: usize,
        frame: usize,
        object_key: Uuid,
    },
    /// Segment directories could not be created.
    CreateDir {
        segment_id: usize,
        path: PathBuf,
        source: std::io::Error,
    },
    /// A frame or mask file could not be written.
    Write {
        segment_id: usize,
        frame: usize,
        source: WriteError,
    },
    /// Seek or decode failure (not end-of-stream).
    Video {
        segment_id: usize,
        source: VideoError,
    },
}

impl ExportError {
    /// Whether the whole run must stop, regardless of the I/O policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExportError::UnmappedObjectReference { .. })
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::UnmappedObjectReference {
                segment_id,
                frame,
                object_key,
            } => write!(
                f,
                "Segment {}, frame {}: object {} has no mapped id/color",
                segment_id,
                frame,
                object_key.simple()
            ),
            ExportError::CreateDir {
                segment_id,
                path,
                source,
            } => write!(
                f,
                "Segment {}: failed to create {}: {}",
                segment_id,
                path.display(),
                source
            ),
            ExportError::Write {
                segment_id,
                frame,
                source,
            } => write!(f, "Segment {}, frame {}: {}", segment_id, frame, source),
            ExportError::Video { segment_id, source } => {
                write!(f, "Segment {}: {}", segment_id, source)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::UnmappedObjectReference { .. } => None,
            ExportError::CreateDir { source, .. } => Some(source),
            ExportError::Write { source, .. } => Some(source),
            ExportError::Video { source, .. } => Some(source),
        }
    }
}
