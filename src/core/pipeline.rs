//! End-to-end run: load inputs, find segments, export them in order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::Serialize;

use super::color::ColorTable;
use super::error::ExportError;
use super::exporter::FrameExporter;
use super::index::AnnotationIndex;
use super::output::{DirSink, SegmentDirs};
use super::segments::{Segment, SegmentFinder};
use crate::config::ExportConfig;
use crate::entities::{
    CanvasSize, FfmpegVideo, KeyIdMap, ObjectIdMap, ProjectMeta, VideoAnnotation, VideoSource,
};

/// Outcome of one segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    pub segment: Segment,
    pub frames_dir: PathBuf,
    pub masks_dir: PathBuf,
    pub frames_written: usize,
    pub truncated: bool,
    /// Set when the segment was skipped after an I/O or decode failure
    pub error: Option<String>,
}

/// Summary of a whole run, serializable for `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub video_name: String,
    pub frame_count: usize,
    pub canvas: CanvasSize,
    pub buffer_frames: usize,
    pub dry_run: bool,
    pub segments: Vec<SegmentReport>,
}

impl ExportReport {
    pub fn frames_written(&self) -> usize {
        self.segments.iter().map(|s| s.frames_written).sum()
    }

    /// Segments that ended with an error
    pub fn failed(&self) -> usize {
        self.segments.iter().filter(|s| s.error.is_some()).count()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

pub struct Pipeline {
    config: ExportConfig,
}

impl Pipeline {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Load every input from disk, open the video and export all segments.
    ///
    /// The decoder lives for the duration of this call and is released on
    /// every return path.
    pub fn run(&self) -> Result<ExportReport> {
        let cfg = &self.config;

        let meta = ProjectMeta::from_file(&cfg.meta_path)
            .with_context(|| format!("Failed to load project meta: {}", cfg.meta_path.display()))?;
        let annotation = VideoAnnotation::from_file(&cfg.annotation_path).with_context(|| {
            format!("Failed to load annotation: {}", cfg.annotation_path.display())
        })?;
        meta.validate(&annotation)
            .context("Annotation does not match project meta")?;

        let overrides = match &cfg.key_id_map {
            Some(path) => Some(
                KeyIdMap::from_file(path)
                    .with_context(|| format!("Failed to load key/id map: {}", path.display()))?,
            ),
            None => None,
        };
        let objects = ObjectIdMap::build(&annotation, overrides.as_ref());
        info!(
            "Loaded {} objects ({} mapped), {} annotated frames, {} figures",
            annotation.objects.len(),
            objects.len(),
            annotation.frames.len(),
            annotation.figure_count()
        );

        let mut video = FfmpegVideo::open(&cfg.video_path)
            .with_context(|| format!("Failed to open video: {}", cfg.video_path.display()))?;
        let props = video.metadata();
        info!(
            "Video {}: {} frames, {}x{} @ {:.3} fps",
            cfg.video_path.display(),
            props.frame_count,
            props.width,
            props.height,
            props.fps
        );

        let report = self.export_with(&annotation, &objects, &mut video)?;

        if let Some(path) = &cfg.report_path {
            report.write_json(path)?;
            info!("Report written to {}", path.display());
        }
        Ok(report)
    }

    /// Export from already-loaded inputs and an open video source.
    pub fn export_with(
        &self,
        annotation: &VideoAnnotation,
        objects: &ObjectIdMap,
        video: &mut dyn VideoSource,
    ) -> Result<ExportReport> {
        let cfg = &self.config;
        let frame_count = video.frame_count();

        if let Some(declared) = annotation.frames_count {
            if declared != frame_count {
                warn!(
                    "Annotation declares {} frames, video has {}",
                    declared, frame_count
                );
            }
        }

        let index = AnnotationIndex::build(&annotation.frames);
        let beyond = index.out_of_range(frame_count);
        if !beyond.is_empty() {
            warn!(
                "{} annotated frames at or past frame {} are ignored: {:?}",
                beyond.len(),
                frame_count,
                beyond
            );
        }

        let colors = ColorTable::from_ids(objects.ids());
        let segments = SegmentFinder::new(cfg.buffer_frames, cfg.policy).find(&index, frame_count);
        info!(
            "Found {} segments ({} annotated frames, buffer {}, {:?})",
            segments.len(),
            index.len(),
            cfg.buffer_frames,
            cfg.policy
        );

        let mut report = ExportReport {
            video_name: cfg.video_name.clone(),
            frame_count,
            canvas: annotation.size,
            buffer_frames: cfg.buffer_frames,
            dry_run: cfg.dry_run,
            segments: Vec::with_capacity(segments.len()),
        };

        let exporter = FrameExporter::new(&index, objects, &colors, annotation.size);

        for segment in &segments {
            let dirs = SegmentDirs::new(&cfg.frames_dir, &cfg.masks_dir, &cfg.video_name, segment);
            let mut entry = SegmentReport {
                segment: *segment,
                frames_dir: dirs.frames.clone(),
                masks_dir: dirs.masks.clone(),
                frames_written: 0,
                truncated: false,
                error: None,
            };

            if cfg.dry_run {
                info!(
                    "[dry-run] Segment {}: frames {}-{} ({} frames)",
                    segment.id,
                    segment.start,
                    segment.end,
                    segment.len()
                );
                report.segments.push(entry);
                continue;
            }

            debug!(
                "Segment {}: frames {}-{} -> {}",
                segment.id,
                segment.start,
                segment.end,
                dirs.frames.display()
            );

            let result = dirs.create(segment.id).and_then(|()| {
                let mut sink = DirSink::new(&dirs);
                exporter.export(segment, video, &mut sink)
            });

            match result {
                Ok(done) => {
                    entry.frames_written = done.frames_written;
                    entry.truncated = done.truncated;
                    info!(
                        "Segment {}/{}: {} frames{}",
                        segment.id + 1,
                        segments.len(),
                        done.frames_written,
                        if done.truncated { " (truncated)" } else { "" }
                    );
                }
                Err(e) if e.is_fatal() || cfg.fail_fast => {
                    error!("{}", e);
                    if let ExportError::UnmappedObjectReference { object_key, .. } = &e {
                        if let Some(object) = annotation.object(object_key) {
                            error!(
                                "Object {} (class '{}') has no id; pass --key-id-map or fix the export",
                                object_key.simple(),
                                object.class_title
                            );
                        }
                    }
                    return Err(e).context("Export aborted");
                }
                Err(e) => {
                    error!("{}; skipping segment", e);
                    entry.error = Some(e.to_string());
                }
            }
            report.segments.push(entry);
        }

        info!(
            "Exported {} frames in {} segments ({} failed)",
            report.frames_written(),
            report.segments.len(),
            report.failed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exporter::tests::FakeVideo;
    use crate::entities::annotation::tests::sample_json;

    fn load() -> (VideoAnnotation, ObjectIdMap) {
        let ann = VideoAnnotation::from_json(&sample_json().to_string()).unwrap();
        let objects = ObjectIdMap::build(&ann, None);
        (ann, objects)
    }

    fn config(root: &Path, buffer: usize) -> ExportConfig {
        let mut cfg = ExportConfig::new("clip.mp4", "clip.json", "meta.json");
        cfg.frames_dir = root.join("JPEGImages");
        cfg.masks_dir = root.join("Annotations");
        cfg.buffer_frames = buffer;
        cfg
    }

    fn list(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_layout_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let (ann, objects) = load();
        let pipeline = Pipeline::new(config(tmp.path(), 1));
        let mut video = FakeVideo::new(6, 10, 8);

        let report = pipeline.export_with(&ann, &objects, &mut video).unwrap();

        // Annotated frames 2 and 3, buffer 1 -> frames 1..=4
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.segments[0].segment, Segment { id: 0, start: 1, end: 4 });
        assert_eq!(report.frames_written(), 4);
        assert_eq!(report.failed(), 0);

        assert_eq!(list(&tmp.path().join("JPEGImages")), vec!["clip_segment_0_frames_1-4"]);
        assert_eq!(
            list(&tmp.path().join("JPEGImages/clip_segment_0_frames_1-4")),
            vec!["00000.jpg", "00001.jpg", "00002.jpg", "00003.jpg"]
        );
        assert_eq!(
            list(&tmp.path().join("Annotations/clip_segment_0_frames_1-4")),
            vec!["00000.png", "00001.png", "00002.png", "00003.png"]
        );
    }

    #[test]
    fn test_runs_are_deterministic() {
        let (ann, objects) = load();
        let mut outputs = Vec::new();

        for _ in 0..2 {
            let tmp = tempfile::tempdir().unwrap();
            let pipeline = Pipeline::new(config(tmp.path(), 0));
            let mut video = FakeVideo::new(6, 10, 8);
            let report = pipeline.export_with(&ann, &objects, &mut video).unwrap();

            let masks_dir = &report.segments[0].masks_dir;
            let masks: Vec<_> = list(masks_dir)
                .iter()
                .map(|name| image::open(masks_dir.join(name)).unwrap().to_rgb8())
                .collect();
            let counts: Vec<_> = report.segments.iter().map(|s| s.frames_written).collect();
            outputs.push((counts, masks));
        }

        assert_eq!(outputs[0].0, vec![2]);
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let (ann, objects) = load();
        let mut cfg = config(tmp.path(), 10);
        cfg.dry_run = true;
        let mut video = FakeVideo::new(6, 10, 8);

        let report = Pipeline::new(cfg).export_with(&ann, &objects, &mut video).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.frames_written(), 0);
        assert_eq!(video.reads, 0);
        assert!(!tmp.path().join("JPEGImages").exists());
    }

    #[test]
    fn test_unmapped_object_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut doc = sample_json();
        doc["objects"][1]["id"] = serde_json::Value::Null;
        let ann = VideoAnnotation::from_json(&doc.to_string()).unwrap();
        let objects = ObjectIdMap::build(&ann, None);
        let mut video = FakeVideo::new(6, 10, 8);

        let err = Pipeline::new(config(tmp.path(), 0))
            .export_with(&ann, &objects, &mut video)
            .unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn test_io_failure_skips_segment() {
        let tmp = tempfile::tempdir().unwrap();
        let (ann, objects) = load();
        let mut cfg = config(tmp.path(), 0);
        // A regular file where the frames base should be
        std::fs::write(&cfg.frames_dir, b"").unwrap();
        let mut video = FakeVideo::new(6, 10, 8);

        let report = Pipeline::new(cfg.clone())
            .export_with(&ann, &objects, &mut video)
            .unwrap();
        assert_eq!(report.failed(), 1);
        assert!(report.segments[0].error.is_some());

        cfg.fail_fast = true;
        let mut video = FakeVideo::new(6, 10, 8);
        assert!(Pipeline::new(cfg).export_with(&ann, &objects, &mut video).is_err());
    }

    #[test]
    fn test_report_json() {
        let tmp = tempfile::tempdir().unwrap();
        let (ann, objects) = load();
        let mut video = FakeVideo::new(6, 10, 8);
        let report = Pipeline::new(config(tmp.path(), 0))
            .export_with(&ann, &objects, &mut video)
            .unwrap();

        let path = tmp.path().join("report.json");
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["video_name"], "clip");
        assert_eq!(value["frame_count"], 6);
        assert_eq!(value["segments"][0]["segment"]["start"], 2);
        assert_eq!(value["segments"][0]["frames_written"], 2);
    }
}
