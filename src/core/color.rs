//! Deterministic object id → mask color.

use std::collections::HashMap;

use image::Rgb;

use crate::entities::ObjectId;

const MULTIPLIERS: [u64; 3] = [37, 73, 109];

/// Color of an object: each channel is `(id * k) mod 256`, k = 37, 73, 109.
///
/// Reduces `id` modulo 256 first, which keeps the result exact for any u64.
/// Distinct ids may share a color; only small dense id ranges are
/// guaranteed to look distinct.
pub fn color_of(id: ObjectId) -> Rgb<u8> {
    let base = id % 256;
    Rgb(MULTIPLIERS.map(|k| ((base * k) % 256) as u8))
}

/// Colors for every mapped object, computed once per run.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    colors: HashMap<ObjectId, Rgb<u8>>,
}

impl ColorTable {
    pub fn from_ids(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            colors: ids.into_iter().map(|id| (id, color_of(id))).collect(),
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<Rgb<u8>> {
        self.colors.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
