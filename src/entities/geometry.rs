//! Figure geometries and their rasterization onto mask canvases.
//!
//! Every shape kind fills through the same [`Rasterize`] capability, so the
//! export core never branches on shape type. Dispatch is static via
//! `enum_dispatch` over [`Geometry`].
//!
//! Coordinates follow the annotation document: `[x, y]` pairs, x = column,
//! y = row, origin at the top-left pixel. All writes clip to the canvas.

use std::io::Read;

use base64::Engine;
use enum_dispatch::enum_dispatch;
use flate2::read::ZlibDecoder;
use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use serde::Deserialize;

use super::annotation::AnnotationError;

/// Fill the region covered by a shape with a solid color.
///
/// Later calls overwrite earlier ones on overlapping pixels (no blending).
#[enum_dispatch]
pub trait Rasterize {
    fn rasterize(&self, canvas: &mut RgbImage, color: Rgb<u8>);
}

/// Shape of one figure.
#[enum_dispatch(Rasterize)]
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rectangle,
    Polygon,
    Polyline,
    Point,
    Bitmap,
}

impl Geometry {
    /// Build a geometry from its `geometryType` tag and `geometry` payload.
    ///
    /// `frame` is only used for error context.
    pub fn from_json(
        kind: &str,
        value: serde_json::Value,
        frame: usize,
    ) -> Result<Self, AnnotationError> {
        let invalid = |reason: String| AnnotationError::InvalidGeometry {
            frame,
            kind: kind.to_string(),
            reason,
        };

        match kind {
            "bitmap" => {
                let shape: BitmapJson =
                    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
                let bitmap = Bitmap::decode(&shape.bitmap.data, shape.bitmap.origin)
                    .map_err(invalid)?;
                return Ok(bitmap.into());
            }
            "rectangle" | "polygon" | "line" | "point" => {}
            other => {
                return Err(AnnotationError::UnsupportedGeometry {
                    frame,
                    kind: other.to_string(),
                });
            }
        }

        let shape: ShapeJson =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        let exterior = shape.points.exterior;

        match kind {
            "rectangle" => {
                let [a, b] = exterior.as_slice() else {
                    return Err(invalid(format!(
                        "expected 2 corner points, got {}",
                        exterior.len()
                    )));
                };
                Ok(Rectangle::from_corners(*a, *b).into())
            }
            "polygon" => {
                if exterior.len() < 3 {
                    return Err(invalid(format!(
                        "polygon needs at least 3 points, got {}",
                        exterior.len()
                    )));
                }
                Ok(Polygon::new(exterior, shape.points.interior).into())
            }
            "line" => {
                if exterior.len() < 2 {
                    return Err(invalid(format!(
                        "line needs at least 2 points, got {}",
                        exterior.len()
                    )));
                }
                Ok(Polyline { points: exterior }.into())
            }
            _ => {
                let [p] = exterior.as_slice() else {
                    return Err(invalid(format!(
                        "expected exactly 1 point, got {}",
                        exterior.len()
                    )));
                };
                Ok(Point { x: p[0], y: p[1] }.into())
            }
        }
    }
}

#[derive(Deserialize)]
struct ShapeJson {
    points: PointsJson,
}

#[derive(Deserialize)]
struct PointsJson {
    exterior: Vec<[f64; 2]>,
    #[serde(default)]
    interior: Vec<Vec<[f64; 2]>>,
}

#[derive(Deserialize)]
struct BitmapJson {
    bitmap: BitmapDataJson,
}

#[derive(Deserialize)]
struct BitmapDataJson {
    data: String,
    origin: [i64; 2],
}

/// Axis-aligned box, inclusive on all four edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rectangle {
    /// Corners may come in any order.
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        let (ax, ay) = (a[0].round() as i64, a[1].round() as i64);
        let (bx, by) = (b[0].round() as i64, b[1].round() as i64);
        Self {
            left: ax.min(bx),
            top: ay.min(by),
            right: ax.max(bx),
            bottom: ay.max(by),
        }
    }
}

impl Rasterize for Rectangle {
    fn rasterize(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        let Some((x0, x1)) = clip_span(self.left, self.right, canvas.width()) else {
            return;
        };
        let Some((y0, y1)) = clip_span(self.top, self.bottom, canvas.height()) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

/// Filled polygon with optional holes.
///
/// The interior is filled with the even-odd rule over all rings, sampled at
/// pixel centers. The exterior outline is drawn on top so boundary pixels
/// are included, matching how annotation tools display filled polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<[f64; 2]>,
    pub interiors: Vec<Vec<[f64; 2]>>,
}

impl Polygon {
    pub fn new(exterior: Vec<[f64; 2]>, interiors: Vec<Vec<[f64; 2]>>) -> Self {
        Self { exterior, interiors }
    }

    fn rings(&self) -> impl Iterator<Item = &[[f64; 2]]> {
        std::iter::once(self.exterior.as_slice()).chain(self.interiors.iter().map(Vec::as_slice))
    }
}

impl Rasterize for Polygon {
    fn rasterize(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 || self.exterior.is_empty() {
            return;
        }

        let min_y = self.exterior.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
        let max_y = self.exterior.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);
        let row_start = min_y.floor().max(0.0) as u32;
        let row_end = (max_y.ceil().max(0.0) as u32).min(height - 1);

        let mut crossings: Vec<f64> = Vec::new();
        for y in row_start..=row_end {
            let yc = y as f64 + 0.5;
            crossings.clear();

            for ring in self.rings() {
                for (i, a) in ring.iter().enumerate() {
                    let b = ring[(i + 1) % ring.len()];
                    if (a[1] <= yc) != (b[1] <= yc) {
                        let t = (yc - a[1]) / (b[1] - a[1]);
                        crossings.push(a[0] + t * (b[0] - a[0]));
                    }
                }
            }
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                // pixel x is inside when its center x + 0.5 lies in [span0, span1]
                let first = (span[0] - 0.5).ceil() as i64;
                let last = (span[1] - 0.5).floor() as i64;
                if let Some((x0, x1)) = clip_span(first, last, width) {
                    for x in x0..=x1 {
                        canvas.put_pixel(x, y, color);
                    }
                }
            }
        }

        let mut outline = self.exterior.clone();
        outline.push(self.exterior[0]);
        draw_polyline(canvas, &outline, color);
    }
}

/// Open polyline, one pixel wide.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<[f64; 2]>,
}

impl Rasterize for Polyline {
    fn rasterize(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        draw_polyline(canvas, &self.points, color);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Rasterize for Point {
    fn rasterize(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        put_clipped(canvas, self.x.round() as i64, self.y.round() as i64, color);
    }
}

/// Raster mask placed with its top-left pixel at `origin` (`[x, y]`).
///
/// Stored as 0/255; every nonzero pixel is painted.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub origin: [i64; 2],
    pub mask: GrayImage,
}

impl Bitmap {
    /// Decode the annotation encoding: base64 of a zlib-compressed PNG.
    ///
    /// PNGs with alpha (palette + transparency, as the annotation tool writes
    /// them) use the alpha channel; others use nonzero luma.
    pub fn decode(data: &str, origin: [i64; 2]) -> Result<Self, String> {
        let compressed = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| format!("bad base64: {}", e))?;

        let mut png = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut png)
            .map_err(|e| format!("bad zlib stream: {}", e))?;

        let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(|e| format!("bad PNG: {}", e))?;

        let mask = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                Luma([if rgba.get_pixel(x, y)[3] > 0 { 255 } else { 0 }])
            })
        } else {
            let luma = img.to_luma8();
            GrayImage::from_fn(luma.width(), luma.height(), |x, y| {
                Luma([if luma.get_pixel(x, y)[0] > 0 { 255 } else { 0 }])
            })
        };

        Ok(Self { origin, mask })
    }
}

impl Rasterize for Bitmap {
    fn rasterize(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        let [ox, oy] = self.origin;
        let x_end = ox.saturating_add(self.mask.width() as i64 - 1);
        let y_end = oy.saturating_add(self.mask.height() as i64 - 1);
        let Some((x0, x1)) = clip_span(ox, x_end, canvas.width()) else {
            return;
        };
        let Some((y0, y1)) = clip_span(oy, y_end, canvas.height()) else {
            return;
        };

        for y in y0..=y1 {
            for x in x0..=x1 {
                let mx = (x as i64 - ox) as u32;
                let my = (y as i64 - oy) as u32;
                if self.mask.get_pixel(mx, my)[0] > 0 {
                    canvas.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// Clip the inclusive range `[lo, hi]` to `[0, len - 1]`.
fn clip_span(lo: i64, hi: i64, len: u32) -> Option<(u32, u32)> {
    if len == 0 || hi < 0 || lo > len as i64 - 1 || lo > hi {
        return None;
    }
    Some((lo.max(0) as u32, hi.min(len as i64 - 1) as u32))
}

fn put_clipped(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < canvas.width() as i64 && y < canvas.height() as i64 {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_polyline(canvas: &mut RgbImage, points: &[[f64; 2]], color: Rgb<u8>) {
    if let [only] = points {
        put_clipped(canvas, only[0].round() as i64, only[1].round() as i64, color);
        return;
    }
    for pair in points.windows(2) {
        draw_segment(canvas, pair[0], pair[1], color);
    }
}

/// Clip segment `a`-`b` to the canvas box `[0, w-1] x [0, h-1]`
/// (Liang-Barsky). `None` when no part of it lies on the canvas.
fn clip_segment(a: [f64; 2], b: [f64; 2], width: u32, height: u32) -> Option<([f64; 2], [f64; 2])> {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    if width == 0 || height == 0 || ![a[0], a[1], dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (max_x, max_y) = ((width - 1) as f64, (height - 1) as f64);

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, a[0]), (dx, max_x - a[0]), (-dy, a[1]), (dy, max_y - a[1])] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    let at = |t: f64| {
        [
            (a[0] + t * dx).clamp(0.0, max_x),
            (a[1] + t * dy).clamp(0.0, max_y),
        ]
    };
    Some((at(t0), at(t1)))
}

/// Bresenham line between two rounded endpoints, endpoints included.
///
/// The segment is clipped first, so the walk never leaves the canvas.
fn draw_segment(canvas: &mut RgbImage, a: [f64; 2], b: [f64; 2], color: Rgb<u8>) {
    let Some((a, b)) = clip_segment(a, b, canvas.width(), canvas.height()) else {
        return;
    };
    let (mut x, mut y) = (a[0].round() as i64, a[1].round() as i64);
    let (x1, y1) = (b[0].round() as i64, b[1].round() as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_clipped(canvas, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn filled(canvas: &RgbImage) -> Vec<(u32, u32)> {
        canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| **p != BLACK)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_rectangle_is_inclusive() {
        let mut canvas = RgbImage::new(6, 6);
        let rect = Rectangle::from_corners([4.0, 3.0], [1.0, 1.0]);
        rect.rasterize(&mut canvas, RED);

        assert_eq!(filled(&canvas).len(), 4 * 3);
        assert_eq!(*canvas.get_pixel(1, 1), RED);
        assert_eq!(*canvas.get_pixel(4, 3), RED);
        assert_eq!(*canvas.get_pixel(5, 3), BLACK);
        assert_eq!(*canvas.get_pixel(1, 4), BLACK);
    }

    #[test]
    fn test_rectangle_clips_to_canvas() {
        let mut canvas = RgbImage::new(4, 4);
        Rectangle::from_corners([-10.0, -10.0], [1.0, 100.0]).rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas).len(), 2 * 4);

        let mut outside = RgbImage::new(4, 4);
        Rectangle::from_corners([10.0, 10.0], [20.0, 20.0]).rasterize(&mut outside, RED);
        assert!(filled(&outside).is_empty());
    }

    #[test]
    fn test_polygon_square_includes_boundary() {
        let mut canvas = RgbImage::new(6, 6);
        let square = Polygon::new(vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]], vec![]);
        square.rasterize(&mut canvas, RED);

        let mut expected = Vec::new();
        for y in 1..=3 {
            for x in 1..=3 {
                expected.push((x, y));
            }
        }
        let mut got = filled(&canvas);
        got.sort_by_key(|&(x, y)| (y, x));
        expected.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(got, expected);
    }

    #[test]
    fn test_polygon_hole_stays_empty() {
        let mut canvas = RgbImage::new(12, 12);
        let ring = Polygon::new(
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            vec![vec![[3.0, 3.0], [7.0, 3.0], [7.0, 7.0], [3.0, 7.0]]],
        );
        ring.rasterize(&mut canvas, RED);

        assert_eq!(*canvas.get_pixel(1, 1), RED);
        assert_eq!(*canvas.get_pixel(5, 5), BLACK);
        assert_eq!(*canvas.get_pixel(9, 5), RED);
        assert_eq!(*canvas.get_pixel(11, 11), BLACK);
    }

    #[test]
    fn test_polygon_outside_canvas_does_not_panic() {
        let mut canvas = RgbImage::new(5, 5);
        let far = Polygon::new(vec![[50.0, 50.0], [60.0, 50.0], [55.0, 70.0]], vec![]);
        far.rasterize(&mut canvas, RED);
        assert!(filled(&canvas).is_empty());

        let negative = Polygon::new(vec![[-20.0, -20.0], [-5.0, -20.0], [-5.0, -5.0]], vec![]);
        negative.rasterize(&mut canvas, RED);
        assert!(filled(&canvas).is_empty());
    }

    #[test]
    fn test_polyline_diagonal() {
        let mut canvas = RgbImage::new(5, 5);
        Polyline { points: vec![[0.0, 0.0], [4.0, 4.0]] }.rasterize(&mut canvas, RED);
        let got = filled(&canvas);
        assert_eq!(got.len(), 5);
        for i in 0..5 {
            assert_eq!(*canvas.get_pixel(i, i), RED);
        }
    }

    #[test]
    fn test_point_single_pixel() {
        let mut canvas = RgbImage::new(3, 3);
        Geometry::from(Point { x: 2.2, y: 0.8 }).rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas), vec![(2, 1)]);
    }

    #[test]
    fn test_last_write_wins() {
        let mut canvas = RgbImage::new(4, 4);
        let shapes: Vec<Geometry> = vec![
            Rectangle::from_corners([0.0, 0.0], [3.0, 3.0]).into(),
            Rectangle::from_corners([2.0, 2.0], [3.0, 3.0]).into(),
        ];
        shapes[0].rasterize(&mut canvas, RED);
        shapes[1].rasterize(&mut canvas, BLUE);

        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(3, 3), BLUE);
    }

    #[test]
    fn test_from_json_kinds() {
        let rect = Geometry::from_json(
            "rectangle",
            json!({"points": {"exterior": [[1, 2], [3, 4]], "interior": []}}),
            0,
        )
        .unwrap();
        assert_eq!(
            rect,
            Geometry::Rectangle(Rectangle { left: 1, top: 2, right: 3, bottom: 4 })
        );

        let poly = Geometry::from_json(
            "polygon",
            json!({"points": {"exterior": [[0, 0], [4, 0], [4, 4]]}}),
            0,
        )
        .unwrap();
        assert!(matches!(poly, Geometry::Polygon(_)));

        let line = Geometry::from_json(
            "line",
            json!({"points": {"exterior": [[0.5, 0.5], [4, 4]], "interior": []}}),
            0,
        )
        .unwrap();
        assert!(matches!(line, Geometry::Polyline(_)));
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        let err = Geometry::from_json("graph", json!({"nodes": {}}), 7).unwrap_err();
        assert!(matches!(err, AnnotationError::UnsupportedGeometry { frame: 7, .. }));

        let err = Geometry::from_json(
            "rectangle",
            json!({"points": {"exterior": [[1, 2]], "interior": []}}),
            3,
        )
        .unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidGeometry { frame: 3, .. }));

        let err = Geometry::from_json("polygon", json!({"nope": 1}), 0).unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_line_far_off_canvas_is_clipped() {
        let mut canvas = RgbImage::new(4, 4);
        Polyline { points: vec![[0.0, 0.0], [1e19, 0.0]] }.rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);

        let mut canvas = RgbImage::new(4, 4);
        Polyline { points: vec![[0.0, 3.0], [2e8, 3.0]] }.rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas), vec![(0, 3), (1, 3), (2, 3), (3, 3)]);

        let mut canvas = RgbImage::new(4, 4);
        Polyline { points: vec![[-1e12, -1e12], [-2e12, 5.0]] }.rasterize(&mut canvas, RED);
        assert!(filled(&canvas).is_empty());
    }

    #[test]
    fn test_line_crossing_canvas() {
        // Enters at the left edge and leaves at the right edge of row 2
        let mut canvas = RgbImage::new(5, 5);
        Polyline { points: vec![[-1e9, 2.0], [1e9, 2.0]] }.rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas).len(), 5);
        for x in 0..5 {
            assert_eq!(*canvas.get_pixel(x, 2), RED);
        }
    }

    #[test]
    fn test_non_finite_line_is_skipped() {
        let mut canvas = RgbImage::new(4, 4);
        Polyline { points: vec![[0.0, 0.0], [f64::INFINITY, 1.0]] }.rasterize(&mut canvas, RED);
        Polyline { points: vec![[f64::NAN, 0.0], [1.0, 1.0]] }.rasterize(&mut canvas, RED);
        assert!(filled(&canvas).is_empty());
    }

    #[test]
    fn test_huge_polygon_covers_canvas() {
        let mut canvas = RgbImage::new(4, 4);
        let huge = Polygon::new(
            vec![[-1e19, -1e19], [1e19, -1e19], [1e19, 1e19], [-1e19, 1e19]],
            vec![],
        );
        huge.rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas).len(), 16);

        let mut canvas = RgbImage::new(4, 4);
        let far = Polygon::new(vec![[1e15, 1e15], [2e15, 1e15], [2e15, 3e15]], vec![]);
        far.rasterize(&mut canvas, RED);
        assert!(filled(&canvas).is_empty());
    }

    fn encode_bitmap(img: &image::DynamicImage) -> String {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::{Cursor, Write};

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(&png).unwrap();
        base64::engine::general_purpose::STANDARD.encode(zlib.finish().unwrap())
    }

    #[test]
    fn test_bitmap_paints_at_origin() {
        let mut mask = GrayImage::new(3, 2);
        mask.put_pixel(0, 0, Luma([1]));
        mask.put_pixel(2, 1, Luma([255]));
        let data = encode_bitmap(&image::DynamicImage::ImageLuma8(mask));

        let geometry = Geometry::from_json(
            "bitmap",
            json!({"bitmap": {"data": data, "origin": [1, 2]}}),
            0,
        )
        .unwrap();
        assert!(matches!(geometry, Geometry::Bitmap(_)));

        let mut canvas = RgbImage::new(6, 6);
        geometry.rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas), vec![(1, 2), (3, 3)]);
    }

    #[test]
    fn test_bitmap_uses_alpha_when_present() {
        // Color values are set everywhere; only alpha marks the mask
        let mut rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 0]));
        rgba.put_pixel(1, 0, image::Rgba([255, 255, 255, 255]));
        let data = encode_bitmap(&image::DynamicImage::ImageRgba8(rgba));

        let bitmap = Bitmap::decode(&data, [0, 0]).unwrap();
        let mut canvas = RgbImage::new(2, 2);
        bitmap.rasterize(&mut canvas, BLUE);
        assert_eq!(filled(&canvas), vec![(1, 0)]);
    }

    #[test]
    fn test_bitmap_clips_to_canvas() {
        let full = GrayImage::from_pixel(3, 3, Luma([255]));
        let bitmap = Bitmap {
            origin: [-1, -1],
            mask: full.clone(),
        };
        let mut canvas = RgbImage::new(2, 2);
        bitmap.rasterize(&mut canvas, RED);
        assert_eq!(filled(&canvas).len(), 4);

        let far = Bitmap {
            origin: [i64::MAX - 1, i64::MIN],
            mask: full,
        };
        let mut canvas = RgbImage::new(2, 2);
        far.rasterize(&mut canvas, RED);
        assert!(filled(&canvas).is_empty());
    }

    #[test]
    fn test_bitmap_bad_data_rejected() {
        let err = Geometry::from_json(
            "bitmap",
            json!({"bitmap": {"data": "not base64 at all!", "origin": [0, 0]}}),
            4,
        )
        .unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidGeometry { frame: 4, .. }));

        let not_zlib = base64::engine::general_purpose::STANDARD.encode(b"plain bytes");
        assert!(Bitmap::decode(&not_zlib, [0, 0]).is_err());
    }
}
