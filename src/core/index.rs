//! Frame index → figures present at that frame.

use std::collections::HashMap;

use crate::entities::{AnnotatedFrame, Figure};

/// Immutable lookup built once per run.
///
/// Frames without figures are absent. Repeated frame indices in the
/// document are concatenated in document order.
#[derive(Debug, Default)]
pub struct AnnotationIndex<'a> {
    frames: HashMap<usize, Vec<&'a Figure>>,
}

impl<'a> AnnotationIndex<'a> {
    pub fn build(frames: &'a [AnnotatedFrame]) -> Self {
        let mut map: HashMap<usize, Vec<&'a Figure>> = HashMap::new();
        for frame in frames {
            if frame.figures.is_empty() {
                continue;
            }
            map.entry(frame.index).or_default().extend(frame.figures.iter());
        }
        Self { frames: map }
    }

    /// Figures at `frame` in document order; empty when none.
    pub fn figures_at(&self, frame: usize) -> &[&'a Figure] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_annotated(&self, frame: usize) -> bool {
        self.frames.contains_key(&frame)
    }

    /// Number of annotated frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Annotated frame indices at or past `frame_count`, sorted.
    pub fn out_of_range(&self, frame_count: usize) -> Vec<usize> {
        let mut beyond: Vec<usize> = self
            .frames
            .keys()
            .copied()
            .filter(|&f| f >= frame_count)
            .collect();
        beyond.sort_unstable();
        beyond
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Geometry, Point};
    use uuid::Uuid;

    fn figure(x: f64) -> Figure {
        Figure {
            object_key: Uuid::nil(),
            geometry: Geometry::from(Point { x, y: 0.0 }),
        }
    }

    fn frame(index: usize, xs: &[f64]) -> AnnotatedFrame {
        AnnotatedFrame {
            index,
            figures: xs.iter().map(|&x| figure(x)).collect(),
        }
    }

    #[test]
    fn test_lookup_and_absent_frames() {
        let frames = vec![frame(3, &[1.0, 2.0]), frame(5, &[]), frame(9, &[4.0])];
        let index = AnnotationIndex::build(&frames);

        assert_eq!(index.len(), 2);
        assert_eq!(index.figures_at(3).len(), 2);
        assert_eq!(index.figures_at(9).len(), 1);
        assert!(index.figures_at(5).is_empty());
        assert!(index.figures_at(0).is_empty());
        assert!(index.figures_at(usize::MAX).is_empty());
        assert!(!index.is_annotated(5));
    }

    #[test]
    fn test_order_preserved_and_duplicates_concatenated() {
        let frames = vec![frame(2, &[1.0, 2.0]), frame(2, &[3.0])];
        let index = AnnotationIndex::build(&frames);

        let xs: Vec<Geometry> = index.figures_at(2).iter().map(|f| f.geometry.clone()).collect();
        assert_eq!(
            xs,
            vec![
                Geometry::from(Point { x: 1.0, y: 0.0 }),
                Geometry::from(Point { x: 2.0, y: 0.0 }),
                Geometry::from(Point { x: 3.0, y: 0.0 }),
            ]
        );
    }

    #[test]
    fn test_out_of_range() {
        let frames = vec![frame(12, &[0.0]), frame(4, &[0.0]), frame(10, &[0.0])];
        let index = AnnotationIndex::build(&frames);
        assert_eq!(index.out_of_range(10), vec![10, 12]);
        assert!(index.out_of_range(100).is_empty());
    }
}
