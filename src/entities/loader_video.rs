//! Video source - FFmpeg-based sequential frame reader
//!
//! One demuxer, one decoder, one read cursor. `seek` repositions the cursor
//! once; `read_next` then yields consecutive frames as RGB8 images until the
//! stream runs dry.

use image::RgbImage;
use log::{debug, trace};
use playa_ffmpeg as ffmpeg;
use std::path::Path;
use std::sync::Once;

static FFMPEG_LOG_INIT: Once = Once::new();

fn init_ffmpeg_logging() {
    FFMPEG_LOG_INIT.call_once(|| {
        unsafe {
            // AV_LOG_QUIET = -8 (silence all output including stderr)
            ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_QUIET);
        }
    });
}

/// Video decoding errors
#[derive(Debug)]
pub enum VideoError {
    Open(String),
    NoVideoStream,
    Seek { frame: usize, reason: String },
    Decode(String),
}

impl std::fmt::Display for VideoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoError::Open(e) => write!(f, "Failed to open video: {}", e),
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::Seek { frame, reason } => {
                write!(f, "Failed to seek to frame {}: {}", frame, reason)
            }
            VideoError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for VideoError {}

/// Sequential-access video with a single read cursor.
///
/// Must not be shared between consumers: a `seek` invalidates whatever
/// position another reader assumed.
pub trait VideoSource {
    fn frame_count(&self) -> usize;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Position the cursor so the next `read_next` yields `frame`.
    fn seek(&mut self, frame: usize) -> Result<(), VideoError>;

    /// Next frame in decode order, or `None` once the source is exhausted.
    fn read_next(&mut self) -> Result<Option<RgbImage>, VideoError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

fn rational_to_f64(r: ffmpeg::Rational) -> f64 {
    if r.denominator() == 0 {
        0.0
    } else {
        r.numerator() as f64 / r.denominator() as f64
    }
}

/// FFmpeg-backed [`VideoSource`]. Resources are released on drop.
pub struct FfmpegVideo {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    time_base: ffmpeg::Rational,
    start_pts: i64,
    metadata: VideoMetadata,
    decoded: ffmpeg::util::frame::video::Video,
    rgb: ffmpeg::util::frame::video::Video,
    /// Frames decoded before this index are dropped (set by `seek`)
    seek_target: Option<usize>,
    eof_sent: bool,
}

impl FfmpegVideo {
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        init_ffmpeg_logging();

        let input = ffmpeg::format::input(path).map_err(|e| VideoError::Open(e.to_string()))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let mut fps = rational_to_f64(stream.avg_frame_rate());
        if fps <= 0.0 {
            fps = rational_to_f64(stream.rate());
        }

        let start_pts = if stream.start_time() == ffmpeg::ffi::AV_NOPTS_VALUE {
            0
        } else {
            stream.start_time()
        };

        // Container frame count when present, otherwise duration * fps
        let frame_count = if stream.frames() > 0 {
            stream.frames() as usize
        } else {
            let duration_secs = stream.duration().max(0) as f64 * rational_to_f64(time_base);
            (duration_secs * fps) as usize
        };

        let decoder_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| VideoError::Open(format!("Failed to create decoder context: {}", e)))?;
        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| VideoError::Open(format!("Failed to create video decoder: {}", e)))?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::Open(format!("Failed to create scaler: {}", e)))?;

        let metadata = VideoMetadata {
            frame_count,
            width,
            height,
            fps,
        };
        debug!(
            "Opened {}: {} frames, {}x{} @ {:.3} fps",
            path.display(),
            frame_count,
            width,
            height,
            fps
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_pts,
            metadata,
            decoded: ffmpeg::util::frame::video::Video::empty(),
            rgb: ffmpeg::util::frame::video::Video::empty(),
            seek_target: None,
            eof_sent: false,
        })
    }

    pub fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    /// Frame index of a stream timestamp.
    fn frame_index(&self, ts: i64) -> usize {
        let secs = (ts - self.start_pts) as f64 * rational_to_f64(self.time_base);
        (secs * self.metadata.fps).round().max(0.0) as usize
    }

    /// Push the next packet of our stream into the decoder, or EOF.
    fn feed(&mut self) -> Result<(), VideoError> {
        loop {
            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    self.decoder
                        .send_packet(&packet)
                        .map_err(|e| VideoError::Decode(format!("Failed to send packet: {}", e)))?;
                    return Ok(());
                }
                None => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| VideoError::Decode(format!("Failed to flush decoder: {}", e)))?;
                    self.eof_sent = true;
                    return Ok(());
                }
            }
        }
    }

    fn to_image(&mut self) -> Result<RgbImage, VideoError> {
        self.scaler
            .run(&self.decoded, &mut self.rgb)
            .map_err(|e| VideoError::Decode(format!("Failed to scale frame: {}", e)))?;

        let width = self.metadata.width;
        let height = self.metadata.height;
        let data = self.rgb.data(0);
        let stride = self.rgb.stride(0);
        let row_bytes = width as usize * 3;

        let mut output = vec![0u8; row_bytes * height as usize];
        for y in 0..height as usize {
            let src = y * stride;
            let dst = y * row_bytes;
            output[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
        }

        RgbImage::from_raw(width, height, output)
            .ok_or_else(|| VideoError::Decode("Frame buffer size mismatch".to_string()))
    }
}

impl VideoSource for FfmpegVideo {
    fn frame_count(&self) -> usize {
        self.metadata.frame_count
    }

    fn width(&self) -> u32 {
        self.metadata.width
    }

    fn height(&self) -> u32 {
        self.metadata.height
    }

    fn seek(&mut self, frame: usize) -> Result<(), VideoError> {
        let fps = if self.metadata.fps > 0.0 { self.metadata.fps } else { 1.0 };
        let start_secs = self.start_pts as f64 * rational_to_f64(self.time_base);
        let target = ((start_secs + frame as f64 / fps) * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;

        // Lands on the keyframe at or before `target`; read_next decodes forward.
        self.input
            .seek(target, ..target)
            .map_err(|e| VideoError::Seek {
                frame,
                reason: e.to_string(),
            })?;
        self.decoder.flush();
        self.eof_sent = false;
        self.seek_target = Some(frame);
        trace!("Seek to frame {} (ts={})", frame, target);
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, VideoError> {
        loop {
            match decode_step(self.decoder.receive_frame(&mut self.decoded))? {
                DecodeStep::Frame => {
                    if let Some(target) = self.seek_target {
                        let index = self
                            .decoded
                            .timestamp()
                            .or(self.decoded.pts())
                            .map(|ts| self.frame_index(ts));
                        if matches!(index, Some(i) if i < target) {
                            continue;
                        }
                        self.seek_target = None;
                    }
                    return self.to_image().map(Some);
                }
                DecodeStep::Drained => return Ok(None),
                DecodeStep::NeedInput if self.eof_sent => return Ok(None),
                DecodeStep::NeedInput => self.feed()?,
            }
        }
    }
}

/// Outcome of one `receive_frame` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeStep {
    Frame,
    /// EAGAIN: the decoder wants another packet
    NeedInput,
    /// EOF: everything sent has been decoded
    Drained,
}

fn decode_step(result: Result<(), ffmpeg::Error>) -> Result<DecodeStep, VideoError> {
    match result {
        Ok(()) => Ok(DecodeStep::Frame),
        Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
            Ok(DecodeStep::NeedInput)
        }
        Err(ffmpeg::Error::Eof) => Ok(DecodeStep::Drained),
        Err(e) => Err(VideoError::Decode(format!("Failed to decode frame: {}", e))),
    }
}
