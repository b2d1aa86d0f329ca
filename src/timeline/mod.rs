//! Timeline: time to frame-slot mapping and frame annotations.
//!
//! The timeline is divided into 101 slots, `0..=100`, each a percentage of
//! the active clip's duration. An [`Annotation`] is pinned to one slot;
//! [`TimelineSync`] owns the collection and its JSON document form.
//!
//! ```rust,ignore
//! use clipview::timeline::{frame_for_time, TimelineSync};
//!
//! assert_eq!(frame_for_time(2.0, 4.0), 50);
//!
//! let mut timeline = TimelineSync::new();
//! timeline.submit_comment(engine.state(), "checkpoint")?;
//! let json = timeline.export_string(Some("walk"), 4.0)?;
//! ```

pub mod annotation;
pub mod document;
pub mod sync;

pub use annotation::{Annotation, MAX_FRAME, MAX_ID};
pub use document::AnnotationDocument;
pub use sync::{TimelineSync, format_time, frame_for_time};
