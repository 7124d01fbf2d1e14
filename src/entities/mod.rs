//! Entities module - external collaborators of the export core
//!
//! - Annotation document (objects, frames, figures) and project meta
//! - Geometry with its rasterization capability
//! - Stable object identity mapping
//! - Video decoding behind the `VideoSource` trait

pub mod annotation;
pub mod geometry;
pub mod loader_video;
pub mod meta;
pub mod objects;

pub use annotation::{
    AnnotatedFrame, AnnotationError, CanvasSize, Figure, TrackedObject, VideoAnnotation,
};
pub use geometry::{Geometry, Point, Polygon, Polyline, Rasterize, Rectangle};
pub use loader_video::{FfmpegVideo, VideoError, VideoMetadata, VideoSource};
pub use meta::{ObjectClass, ProjectMeta};
pub use objects::{KeyIdMap, ObjectId, ObjectIdMap};
