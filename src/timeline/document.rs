use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::annotation::{Annotation, iso_millis};

/// The exported annotation file.
///
/// Only `comments` is read back on import; the other fields describe the
/// export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDocument {
    pub animation: Option<String>,
    pub duration: f32,
    pub comments: Vec<Annotation>,
    #[serde(with = "iso_millis")]
    pub export_date: DateTime<Utc>,
}
