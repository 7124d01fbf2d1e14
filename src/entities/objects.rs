//! Object key → stable integer id.
//!
//! Ids are looked up by each object's own key. A `key_id_map.json` (as
//! written by Supervisely's download tools) can supply or override ids.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;
use uuid::Uuid;

use super::annotation::{read_to_string, AnnotationError, VideoAnnotation};

/// Stable id used as the color-assignment key
pub type ObjectId = u64;

/// External key → id document. Only the `objects` section is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyIdMap {
    #[serde(default)]
    pub objects: HashMap<Uuid, ObjectId>,
}

impl KeyIdMap {
    pub fn from_file(path: &Path) -> Result<Self, AnnotationError> {
        Self::from_json(&read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Self, AnnotationError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectIdMap {
    ids: HashMap<Uuid, ObjectId>,
}

impl ObjectIdMap {
    /// Pair every tracked object with its id through its key.
    ///
    /// Objects with no id from either source are left out; figures of such
    /// objects fail at export time.
    pub fn build(annotation: &VideoAnnotation, overrides: Option<&KeyIdMap>) -> Self {
        let mut ids = HashMap::with_capacity(annotation.objects.len());

        for object in &annotation.objects {
            let from_map = overrides.and_then(|m| m.objects.get(&object.key).copied());
            match (from_map, object.id) {
                (Some(mapped), Some(declared)) if mapped != declared => {
                    debug!(
                        "Object {}: key_id_map id {} overrides declared id {}",
                        object.key.simple(),
                        mapped,
                        declared
                    );
                    ids.insert(object.key, mapped);
                }
                (Some(id), _) | (None, Some(id)) => {
                    ids.insert(object.key, id);
                }
                (None, None) => {
                    warn!(
                        "Object {} ({}) has no id; its figures cannot be exported",
                        object.key.simple(),
                        object.class_title
                    );
                }
            }
        }

        Self { ids }
    }

    pub fn id_of(&self, key: &Uuid) -> Option<ObjectId> {
        self.ids.get(key).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.ids.values().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
