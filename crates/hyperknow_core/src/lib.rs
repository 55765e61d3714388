//! Hyperknow core: pure generation-pipeline state machine and view-model helpers.
mod effect;
mod msg;
mod phase;
mod section;
mod state;
mod stats;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use phase::{phase_for_message, Phase};
pub use section::{
    merge_sections, seed_sections, OutlineSeed, OutlineSection, SectionEntry, SectionId,
    SectionStatus,
};
pub use state::{Alert, ConceptExtras, DocumentState, QuerySpec};
pub use stats::{article_stats, ArticleStats};
pub use update::{
    content_retry_delay, update, CONTENT_POLL_INTERVAL, CONTENT_RETRY_LIMIT,
    SECTION_POLL_INTERVAL, STALL_CHECK_INTERVAL,
};
pub use view_model::{DocumentViewModel, Screen, SectionRowView};
