//! VOSPREP - video annotation to VOS dataset converter
//!
//! Re-exports all modules for use by the binary target.

// Segmentation and export core (index, colors, segments, exporter, pipeline)
pub mod core;

// Annotation model, geometry and video decoding
pub mod entities;

// App modules
pub mod cli;
pub mod config;

// Re-export commonly used types from core
pub use core::{ExportReport, FrameExporter, Pipeline, Segment, SegmentFinder, SegmentPolicy};

// Re-export entities
pub use entities::{FfmpegVideo, ObjectIdMap, VideoAnnotation, VideoSource};

pub use config::ExportConfig;
