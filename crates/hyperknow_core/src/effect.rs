use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a new generation job.
    SubmitQuery {
        query: String,
        book_ids: Vec<String>,
        web_search: bool,
        comments: Option<String>,
    },
    /// Open the phase event stream for an accepted job.
    OpenEventStream {
        conversation_id: String,
        query: String,
        book_ids: Vec<String>,
        web_search: bool,
    },
    /// Fetch the accumulated article text after `delay`.
    FetchContent {
        conversation_id: String,
        delay: Duration,
    },
    /// Fetch the outline and per-section status after `delay`.
    FetchSections {
        conversation_id: String,
        delay: Duration,
    },
    /// One-shot fetch of a finished article (archive read path).
    FetchArchivedArticle { conversation_id: String },
    /// One-time post-completion diagram and related-topics fetch.
    FetchExtras { conversation_id: String },
    /// Persist the session so polling can resume after a restart.
    PersistSession { conversation_id: String },
    /// Re-check the progress mark after `delay`.
    ScheduleStallCheck { mark: u64, delay: Duration },
}
