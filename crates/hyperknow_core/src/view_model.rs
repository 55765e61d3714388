use crate::section::{SectionId, SectionStatus};
use crate::state::ConceptExtras;
use crate::stats::ArticleStats;
use crate::Phase;

/// Which top-level screen the app should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Search,
    CollectingSources,
    GeneratingOutline,
    Article,
}

pub(crate) fn screen_for(phase: Phase, archive: bool) -> Screen {
    if archive {
        return Screen::Article;
    }
    match phase {
        Phase::Idle => Screen::Search,
        Phase::SourceCollecting => Screen::CollectingSources,
        Phase::OutlineGenerating => Screen::GeneratingOutline,
        Phase::SectionWriting | Phase::StreamingArticle | Phase::Complete => Screen::Article,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentViewModel {
    pub screen: Screen,
    pub phase: Phase,
    pub archive: bool,
    /// The latest full snapshot; rendering is a pure function of this string.
    pub markdown: String,
    pub is_complete: bool,
    /// Show the in-progress placeholder under the rendered content.
    pub show_placeholder: bool,
    pub sections: Vec<SectionRowView>,
    pub stats: ArticleStats,
    pub alert: Option<String>,
    pub extras: Option<ConceptExtras>,
    pub latest_stream_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRowView {
    pub section_id: SectionId,
    pub title: String,
    pub learning_goals: Vec<String>,
    pub status: SectionStatus,
    pub expanded: bool,
}
