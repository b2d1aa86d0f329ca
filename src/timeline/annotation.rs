use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Highest frame slot on the timeline.
pub const MAX_FRAME: u32 = 100;

/// Largest id a JSON number carries exactly (`2^53 - 1`).
pub const MAX_ID: u64 = (1 << 53) - 1;

/// A comment pinned to a frame slot of a clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    /// Slot in `0..=100`.
    pub frame: u32,
    pub text: String,
    /// Clip the comment was written against.
    #[serde(rename = "animation")]
    pub clip_name: Option<String>,
    #[serde(rename = "timestamp", with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    #[must_use]
    pub fn new(id: u64, frame: u32, text: impl Into<String>, clip_name: Option<String>) -> Self {
        Self {
            id,
            frame: frame.min(MAX_FRAME),
            text: text.into(),
            clip_name,
            created_at: now_millis(),
        }
    }
}

/// Current time truncated to the precision of the document format.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// ISO-8601 UTC timestamps with millisecond precision (`2024-05-01T12:00:00.000Z`).
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
            .map_err(serde::de::Error::custom)
    }
}
