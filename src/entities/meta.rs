//! Project meta (`meta.json`): the class schema annotations are checked against.

use std::path::Path;

use serde::Deserialize;

use super::annotation::{read_to_string, AnnotationError, VideoAnnotation};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectClass {
    pub title: String,
    /// Declared shape ("polygon", "rectangle", "any", ...)
    pub shape: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    #[serde(default)]
    pub classes: Vec<ObjectClass>,
    #[serde(default)]
    pub project_type: Option<String>,
}

impl ProjectMeta {
    pub fn from_file(path: &Path) -> Result<Self, AnnotationError> {
        Self::from_json(&read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Self, AnnotationError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn class(&self, title: &str) -> Option<&ObjectClass> {
        self.classes.iter().find(|c| c.title == title)
    }

    /// Every tracked object must belong to a declared class.
    pub fn validate(&self, annotation: &VideoAnnotation) -> Result<(), AnnotationError> {
        for object in &annotation.objects {
            if self.class(&object.class_title).is_none() {
                return Err(AnnotationError::UnknownClass {
                    object: object.key,
                    class: object.class_title.clone(),
                });
            }
        }
        Ok(())
    }
}
