//! Rich-text document → destination block conversion.
//!
//! The converter stack: [`segment_rich_text`] splits formatted inline
//! content into bounded annotated runs, [`convert_document`] walks a parsed
//! element tree into an ordered [`Block`] list, and [`enforce_child_limit`] /
//! [`split_for_creation`] apply the destination's per-request ceilings.

mod block;
mod chunk;
mod convert;
mod emoji;
mod language;
mod rich_text;

pub use block::{Block, MediaRef, TableRow};
pub use chunk::{MAX_CHILDREN, enforce_child_limit, split_for_creation};
pub use convert::{ConvertOptions, convert_document};
pub use language::{DEFAULT_LANGUAGE, normalize_language};
pub use rich_text::{
    Annotations, MAX_RUN_LEN, RichTextRun, absolute_url, segment_rich_text, split_long_text,
};
