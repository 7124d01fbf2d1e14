//! Video annotation document (Supervisely JSON format).
//!
//! Only the parts the exporter needs are modeled: canvas size, tracked
//! objects, and per-frame figures. Unknown fields are ignored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::Geometry;

/// Annotation loading errors
#[derive(Debug)]
pub enum AnnotationError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
    UnknownObjectKey { frame: usize, key: Uuid },
    UnknownClass { object: Uuid, class: String },
    UnsupportedGeometry { frame: usize, kind: String },
    InvalidGeometry { frame: usize, kind: String, reason: String },
}

impl std::fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            AnnotationError::Json(e) => write!(f, "Malformed JSON: {}", e),
            AnnotationError::UnknownObjectKey { frame, key } => write!(
                f,
                "Figure at frame {} references unknown object {}",
                frame,
                key.simple()
            ),
            AnnotationError::UnknownClass { object, class } => write!(
                f,
                "Object {} has class '{}' which is not declared in the project meta",
                object.simple(),
                class
            ),
            AnnotationError::UnsupportedGeometry { frame, kind } => {
                write!(f, "Unsupported geometry '{}' at frame {}", kind, frame)
            }
            AnnotationError::InvalidGeometry { frame, kind, reason } => {
                write!(f, "Invalid {} geometry at frame {}: {}", kind, frame, reason)
            }
        }
    }
}

impl std::error::Error for AnnotationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnnotationError::Io { source, .. } => Some(source),
            AnnotationError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AnnotationError {
    fn from(e: serde_json::Error) -> Self {
        AnnotationError::Json(e)
    }
}

/// Read a whole file, keeping the path for error messages.
pub(crate) fn read_to_string(path: &Path) -> Result<String, AnnotationError> {
    std::fs::read_to_string(path).map_err(|source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Declared canvas size; masks are rendered at exactly this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub height: u32,
    pub width: u32,
}

/// Entity tracked across frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedObject {
    /// Persistent key referenced by figures
    pub key: Uuid,
    pub class_title: String,
    /// Server-side id, when the export carries one
    #[serde(default)]
    pub id: Option<u64>,
}

/// One annotated shape at one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub object_key: Uuid,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFrame {
    pub index: usize,
    pub figures: Vec<Figure>,
}

/// Parsed, validated annotation for one video. Immutable after loading.
#[derive(Debug, Clone)]
pub struct VideoAnnotation {
    pub size: CanvasSize,
    pub frames_count: Option<usize>,
    pub objects: Vec<TrackedObject>,
    pub frames: Vec<AnnotatedFrame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnnotation {
    size: CanvasSize,
    #[serde(default)]
    frames_count: Option<usize>,
    #[serde(default)]
    objects: Vec<TrackedObject>,
    #[serde(default)]
    frames: Vec<RawFrame>,
}

#[derive(Deserialize)]
struct RawFrame {
    index: usize,
    #[serde(default)]
    figures: Vec<RawFigure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFigure {
    object_key: Uuid,
    geometry_type: String,
    geometry: serde_json::Value,
}

impl VideoAnnotation {
    pub fn from_file(path: &Path) -> Result<Self, AnnotationError> {
        Self::from_json(&read_to_string(path)?)
    }

    /// Parse and resolve every figure's geometry and object reference.
    pub fn from_json(text: &str) -> Result<Self, AnnotationError> {
        let raw: RawAnnotation = serde_json::from_str(text)?;

        let known: HashSet<Uuid> = raw.objects.iter().map(|o| o.key).collect();

        let mut frames = Vec::with_capacity(raw.frames.len());
        for raw_frame in raw.frames {
            let mut figures = Vec::with_capacity(raw_frame.figures.len());
            for fig in raw_frame.figures {
                if !known.contains(&fig.object_key) {
                    return Err(AnnotationError::UnknownObjectKey {
                        frame: raw_frame.index,
                        key: fig.object_key,
                    });
                }
                let geometry =
                    Geometry::from_json(&fig.geometry_type, fig.geometry, raw_frame.index)?;
                figures.push(Figure {
                    object_key: fig.object_key,
                    geometry,
                });
            }
            frames.push(AnnotatedFrame {
                index: raw_frame.index,
                figures,
            });
        }

        Ok(Self {
            size: raw.size,
            frames_count: raw.frames_count,
            objects: raw.objects,
            frames,
        })
    }

    pub fn object(&self, key: &Uuid) -> Option<&TrackedObject> {
        self.objects.iter().find(|o| &o.key == key)
    }

    pub fn figure_count(&self) -> usize {
        self.frames.iter().map(|f| f.figures.len()).sum()
    }
}
