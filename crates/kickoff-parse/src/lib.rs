//! Schedule extraction: find the repeating rows, pull their fields, and turn
//! the date/time text into timestamps.

pub mod datetime;
pub mod fields;
pub mod structure;
pub mod text;

pub use datetime::{normalize, resolve_date, resolve_time, DateParseError};
pub use fields::{extract, is_away_text, strip_direction, FieldRules, Strategy};
pub use structure::{detect, ScheduleStructure, StructureNotFound, StructurePatterns};
