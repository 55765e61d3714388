use crate::section::{OutlineSeed, SectionEntry, SectionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a query from the search screen.
    QuerySubmitted {
        query: String,
        book_ids: Vec<String>,
        web_search: bool,
        comments: Option<String>,
    },
    /// Backend accepted the query and assigned a conversation id.
    JobCreated { conversation_id: String },
    /// The query could not be started.
    SubmissionFailed { reason: String },
    /// One raw line from the generation event stream.
    StreamMessage(String),
    /// The event stream dropped. `reason` is set on transport error.
    StreamClosed { reason: Option<String> },
    /// Content poll response: a full-replacement snapshot.
    ContentPollArrived { markdown: String, is_complete: bool },
    /// Content poll failed for this cycle.
    ContentPollFailed { reason: String },
    /// Section-progress poll response.
    SectionPollArrived {
        outline: Option<OutlineSeed>,
        sections: Vec<SectionEntry>,
        is_complete: bool,
    },
    /// Section-progress poll failed for this cycle.
    SectionPollFailed { reason: String },
    /// User toggled a section row in the outline view.
    SectionToggled { section_id: SectionId },
    /// Open a previously generated article read-only.
    ArchiveOpened { conversation_id: String },
    /// Archived article body arrived.
    ArchiveLoaded { markdown: String },
    /// Archived article could not be fetched.
    ArchiveLoadFailed { reason: String },
    /// Post-completion diagram and related-topics payload arrived.
    ExtrasArrived {
        mermaid_source: String,
        related_topics: Vec<String>,
    },
    /// Diagram payload could not be fetched; the article view is unaffected.
    ExtrasFailed { reason: String },
    /// Stall timer fired. `mark` is the progress mark captured at scheduling.
    StallCheck { mark: u64 },
    /// Resume polling an in-flight conversation restored from a saved session.
    ResumeConversation { conversation_id: String },
}
