//! Recognition tables shared by every parser, the aggregator and the validator.
//!
//! Both tables are ordered lists of `(matcher, outcome)` pairs evaluated top to
//! bottom, so every component classifies the same text the same way.

pub mod level;
pub mod timestamp;

pub use level::{ErrorKeywords, LevelClassifier, LevelMarker};
pub use timestamp::{parse_common_log, parse_instant, TimestampExtractor, TimestampLayout, TimestampMatch};
