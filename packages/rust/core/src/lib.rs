//! End-to-end export pipeline: bookmarks → fetch → filter → convert →
//! chunk → relay → guarded commit.

mod assemble;
mod export;
mod filter;
mod properties;

pub use assemble::assemble_topic_blocks;
pub use export::{
    ExportItem, ExportOptions, ExportOrchestrator, ExportReport, ItemState, JobControl, Progress,
    ProgressSink, SilentProgress, Stage,
};
pub use filter::{PostFilters, filter_posts};
pub use properties::build_properties;
