//! Core modules - indexing, coloring, segment discovery, export
//!
//! Pure with respect to the annotation model: geometry and decoding live
//! in `entities`, this layer only orchestrates them.

pub mod color;
pub mod error;
pub mod exporter;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod segments;

// Re-exports for convenience
pub use color::{color_of, ColorTable};
pub use error::ExportError;
pub use exporter::{FrameExporter, SegmentExport};
pub use index::AnnotationIndex;
pub use output::{frame_stem, DirSink, FrameSink, SegmentDirs, WriteError};
pub use pipeline::{ExportReport, Pipeline, SegmentReport};
pub use segments::{Segment, SegmentFinder, SegmentPolicy, DEFAULT_BUFFER_FRAMES};
