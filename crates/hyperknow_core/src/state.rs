use std::collections::BTreeSet;
use std::fmt;

use crate::section::{merge_sections, seed_sections, OutlineSeed, SectionEntry, SectionId};
use crate::view_model::{DocumentViewModel, SectionRowView};
use crate::{article_stats, Phase};

/// The query parameters a job was started with, kept for the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub query: String,
    pub book_ids: Vec<String>,
    pub web_search: bool,
    pub comments: Option<String>,
}

/// Post-completion concept diagram and related topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptExtras {
    pub mermaid_source: String,
    pub related_topics: Vec<String>,
}

/// User-visible failure surfaced next to the document view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    SubmissionFailed(String),
    StreamLost(String),
    Stalled,
    ArchiveUnavailable(String),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::SubmissionFailed(reason) => write!(f, "Could not start generation: {reason}"),
            Alert::StreamLost(reason) => write!(f, "Lost connection to the backend: {reason}"),
            Alert::Stalled => write!(f, "Generation stalled; no progress from the backend"),
            Alert::ArchiveUnavailable(reason) => write!(f, "Could not load article: {reason}"),
        }
    }
}

/// State of one loaded document view, mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentState {
    phase: Phase,
    conversation_id: Option<String>,
    pending_query: Option<QuerySpec>,
    markdown: String,
    is_complete: bool,
    sections: Vec<SectionEntry>,
    outline_seeded: bool,
    expanded: BTreeSet<SectionId>,
    archive: bool,
    stream_log: Vec<String>,
    alert: Option<Alert>,
    content_retries: u32,
    progress_mark: u64,
    extras: Option<ConceptExtras>,
    dirty: bool,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn pending_query(&self) -> Option<&QuerySpec> {
        self.pending_query.as_ref()
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_archive(&self) -> bool {
        self.archive
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self.alert, Some(Alert::Stalled))
    }

    pub fn progress_mark(&self) -> u64 {
        self.progress_mark
    }

    pub fn content_retries(&self) -> u32 {
        self.content_retries
    }

    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    /// Returns the accumulated dirty flag and clears it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> DocumentViewModel {
        DocumentViewModel {
            screen: crate::view_model::screen_for(self.phase, self.archive),
            phase: self.phase,
            archive: self.archive,
            markdown: self.markdown.clone(),
            is_complete: self.is_complete,
            show_placeholder: !self.is_complete && !self.archive && self.phase.has_article_view(),
            sections: self
                .sections
                .iter()
                .map(|section| SectionRowView {
                    section_id: section.section_id.clone(),
                    title: section.title.clone(),
                    learning_goals: section.learning_goals.clone(),
                    status: section.status,
                    expanded: self.expanded.contains(&section.section_id),
                })
                .collect(),
            stats: article_stats(&self.markdown),
            alert: self.alert.as_ref().map(ToString::to_string),
            extras: self.extras.clone(),
            latest_stream_line: self.stream_log.last().cloned(),
        }
    }

    pub(crate) fn begin_submission(&mut self, spec: QuerySpec) {
        self.pending_query = Some(spec);
        self.alert = None;
        self.dirty = true;
    }

    pub(crate) fn set_conversation(&mut self, conversation_id: String) {
        self.conversation_id = Some(conversation_id);
        self.dirty = true;
    }

    /// Moves the phase forward; lower or equal ranks are no-ops.
    /// Returns whether the phase changed.
    pub(crate) fn advance_phase(&mut self, next: Phase) -> bool {
        if next <= self.phase {
            return false;
        }
        self.phase = next;
        self.progress_mark += 1;
        self.dirty = true;
        true
    }

    pub(crate) fn push_stream_line(&mut self, line: String) {
        self.stream_log.push(line);
        self.dirty = true;
    }

    pub(crate) fn clear_snapshot(&mut self) {
        self.markdown.clear();
        self.is_complete = false;
        self.dirty = true;
    }

    /// Installs a poll response verbatim. The new snapshot always supersedes
    /// the old one in full; the client never appends.
    pub(crate) fn replace_snapshot(&mut self, markdown: String, is_complete: bool) {
        if markdown != self.markdown {
            self.progress_mark += 1;
        }
        self.markdown = markdown;
        self.is_complete = is_complete;
        self.content_retries = 0;
        self.dirty = true;
    }

    pub(crate) fn note_content_failure(&mut self) -> u32 {
        self.content_retries += 1;
        self.content_retries
    }

    /// Seeds the section list from the outline, exactly once.
    pub(crate) fn seed_outline(&mut self, outline: &OutlineSeed) {
        if self.outline_seeded {
            return;
        }
        self.outline_seeded = true;
        if self.sections.is_empty() {
            self.sections = seed_sections(outline);
        }
        self.dirty = true;
    }

    pub(crate) fn merge_section_update(&mut self, incoming: &[SectionEntry]) {
        if incoming.is_empty() {
            return;
        }
        merge_sections(&mut self.sections, incoming);
        self.dirty = true;
    }

    pub(crate) fn toggle_expanded(&mut self, section_id: SectionId) {
        if !self.expanded.remove(&section_id) {
            self.expanded.insert(section_id);
        }
        self.dirty = true;
    }

    pub(crate) fn set_alert(&mut self, alert: Alert) {
        self.alert = Some(alert);
        self.dirty = true;
    }

    pub(crate) fn set_extras(&mut self, extras: ConceptExtras) {
        self.extras = Some(extras);
        self.dirty = true;
    }

    /// Resets the document for a read-only archive view of `conversation_id`.
    pub(crate) fn reset_for_archive(&mut self, conversation_id: String) {
        *self = Self {
            conversation_id: Some(conversation_id),
            archive: true,
            dirty: true,
            ..Self::default()
        };
    }

    pub(crate) fn install_archived(&mut self, markdown: String) {
        self.markdown = markdown;
        self.is_complete = true;
        self.phase = Phase::Complete;
        self.dirty = true;
    }

    /// Restores an in-flight conversation; writing is assumed already started.
    pub(crate) fn resume_conversation(&mut self, conversation_id: String) {
        self.conversation_id = Some(conversation_id);
        self.phase = Phase::SectionWriting;
        self.progress_mark += 1;
        self.dirty = true;
    }
}
