//! Per-segment frame/mask extraction.
//!
//! One absolute seek to the segment start, then strictly sequential reads.
//! Output stems are re-based to the segment start, so the absolute frame
//! index never appears in file names.

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{debug, info};

use super::color::ColorTable;
use super::error::ExportError;
use super::index::AnnotationIndex;
use super::output::{frame_stem, FrameSink};
use super::segments::Segment;
use crate::entities::{CanvasSize, ObjectIdMap, Rasterize, VideoSource};

/// Outcome of one exported segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentExport {
    pub frames_written: usize,
    /// The source ran out before `segment.len()` frames were read
    pub truncated: bool,
}

/// Shared, read-only context for exporting any number of segments.
pub struct FrameExporter<'a> {
    index: &'a AnnotationIndex<'a>,
    objects: &'a ObjectIdMap,
    colors: &'a ColorTable,
    canvas: CanvasSize,
}

impl<'a> FrameExporter<'a> {
    pub fn new(
        index: &'a AnnotationIndex<'a>,
        objects: &'a ObjectIdMap,
        colors: &'a ColorTable,
        canvas: CanvasSize,
    ) -> Self {
        Self {
            index,
            objects,
            colors,
            canvas,
        }
    }

    /// Export `segment` from `video` into `sink`.
    ///
    /// Writes at most `segment.len()` pairs; stops quietly if the source is
    /// exhausted first. The mask is rendered before anything is written, so
    /// an unmapped object never leaves an orphan frame behind.
    pub fn export(
        &self,
        segment: &Segment,
        video: &mut dyn VideoSource,
        sink: &mut dyn FrameSink,
    ) -> Result<SegmentExport, ExportError> {
        let video_err = |source| ExportError::Video {
            segment_id: segment.id,
            source,
        };

        video.seek(segment.start).map_err(video_err)?;

        let expected = segment.len();
        let mut written = 0;

        for frame_idx in segment.start..=segment.end {
            let Some(frame) = video.read_next().map_err(video_err)? else {
                info!(
                    "Segment {}: source exhausted at frame {}, kept {}/{} frames",
                    segment.id, frame_idx, written, expected
                );
                return Ok(SegmentExport {
                    frames_written: written,
                    truncated: true,
                });
            };

            let mask = self.render_mask(segment.id, frame_idx)?;
            let frame = self.fit_to_canvas(frame);
            let stem = frame_stem(frame_idx - segment.start);

            let write_err = |source| ExportError::Write {
                segment_id: segment.id,
                frame: frame_idx,
                source,
            };
            sink.write_frame(&stem, &frame).map_err(write_err)?;
            sink.write_mask(&stem, &mask).map_err(write_err)?;
            written += 1;
        }

        debug!("Segment {}: wrote {} frames", segment.id, written);
        Ok(SegmentExport {
            frames_written: written,
            truncated: false,
        })
    }

    /// Mask for absolute frame `frame_idx`: black canvas, figures filled in
    /// document order with their object's color, last write wins.
    pub fn render_mask(&self, segment_id: usize, frame_idx: usize) -> Result<RgbImage, ExportError> {
        let mut mask = RgbImage::new(self.canvas.width, self.canvas.height);

        for figure in self.index.figures_at(frame_idx) {
            let color = self
                .objects
                .id_of(&figure.object_key)
                .and_then(|id| self.colors.get(id))
                .ok_or(ExportError::UnmappedObjectReference {
                    segment_id,
                    frame: frame_idx,
                    object_key: figure.object_key,
                })?;
            figure.geometry.rasterize(&mut mask, color);
        }

        Ok(mask)
    }

    /// Resize decoded frames to the declared canvas size when they differ.
    fn fit_to_canvas(&self, frame: RgbImage) -> RgbImage {
        if frame.dimensions() == (self.canvas.width, self.canvas.height) {
            return frame;
        }
        imageops::resize(
            &frame,
            self.canvas.width,
            self.canvas.height,
            FilterType::Triangle,
        )
    }
}
