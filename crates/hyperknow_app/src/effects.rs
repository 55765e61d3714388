use std::path::PathBuf;

use hyperknow_core::{Effect, Msg, OutlineSeed, OutlineSection, SectionEntry, SectionStatus};
use hyperknow_pipeline::{
    GenerationStreamParams, OutlineDto, PipelineEvent, PipelineHandle, QueryRequest, SectionDto,
    SectionStatusDto,
};
use pipeline_logging::{pipeline_info, pipeline_warn};

use crate::session::{save_session, SessionContext};

/// Executes reducer effects against the pipeline worker.
pub struct EffectRunner {
    handle: PipelineHandle,
    user_id: String,
    session_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(handle: PipelineHandle, user_id: String, session_dir: PathBuf) -> Self {
        Self {
            handle,
            user_id,
            session_dir,
        }
    }

    pub fn handle(&self) -> &PipelineHandle {
        &self.handle
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitQuery {
                    query,
                    book_ids,
                    web_search,
                    comments,
                } => {
                    pipeline_info!("Submitting query len={} books={}", query.len(), book_ids.len());
                    self.handle.submit(
                        &self.user_id,
                        QueryRequest {
                            query,
                            book_ids,
                            web_search,
                            comments,
                        },
                    );
                }
                Effect::OpenEventStream {
                    conversation_id,
                    query,
                    book_ids,
                    web_search,
                } => {
                    self.handle.open_stream(GenerationStreamParams {
                        user_id: self.user_id.clone(),
                        conversation_id,
                        query,
                        book_ids,
                        web_search,
                    });
                }
                Effect::FetchContent {
                    conversation_id,
                    delay,
                } => self
                    .handle
                    .poll_content(&self.user_id, conversation_id, delay),
                Effect::FetchSections {
                    conversation_id,
                    delay,
                } => self
                    .handle
                    .poll_sections(&self.user_id, conversation_id, delay),
                Effect::FetchArchivedArticle { conversation_id } => {
                    self.handle.fetch_archive(&self.user_id, conversation_id);
                }
                Effect::FetchExtras { conversation_id } => {
                    self.handle.fetch_extras(&self.user_id, conversation_id);
                }
                Effect::PersistSession { conversation_id } => {
                    pipeline_logging::set_log_conversation(Some(&conversation_id));
                    save_session(
                        &self.session_dir,
                        &SessionContext {
                            user_id: Some(self.user_id.clone()),
                            conversation_id: Some(conversation_id),
                        },
                    );
                }
                Effect::ScheduleStallCheck { mark, delay } => {
                    self.handle.schedule_stall_check(mark, delay);
                }
            }
        }
    }
}

/// Converts a pipeline event into a reducer message. Listing events are
/// consumed by the list mode directly and yield `None` here.
pub fn map_event(event: PipelineEvent) -> Option<Msg> {
    let msg = match event {
        PipelineEvent::JobAccepted { conversation_id } => Msg::JobCreated { conversation_id },
        PipelineEvent::SubmissionFailed { error } => Msg::SubmissionFailed {
            reason: error.to_string(),
        },
        PipelineEvent::StreamMessage(line) => Msg::StreamMessage(line),
        PipelineEvent::StreamClosed { error } => {
            if let Some(error) = &error {
                pipeline_warn!("Event stream closed: {error}");
            }
            Msg::StreamClosed {
                reason: error.map(|e| e.to_string()),
            }
        }
        PipelineEvent::ContentArrived(snapshot) => Msg::ContentPollArrived {
            markdown: snapshot.markdown,
            is_complete: snapshot.is_complete,
        },
        PipelineEvent::ContentFailed { error } => {
            pipeline_warn!("Content poll failed: {error}");
            Msg::ContentPollFailed {
                reason: error.to_string(),
            }
        }
        PipelineEvent::SectionsArrived(snapshot) => Msg::SectionPollArrived {
            outline: snapshot.outline.map(map_outline),
            sections: snapshot.sections.into_iter().map(map_section).collect(),
            is_complete: snapshot.is_complete,
        },
        PipelineEvent::SectionsFailed { error } => {
            pipeline_warn!("Section poll failed: {error}");
            Msg::SectionPollFailed {
                reason: error.to_string(),
            }
        }
        PipelineEvent::ArchiveArrived { markdown } => Msg::ArchiveLoaded { markdown },
        PipelineEvent::ArchiveFailed { error } => Msg::ArchiveLoadFailed {
            reason: error.to_string(),
        },
        PipelineEvent::ExtrasArrived(bundle) => Msg::ExtrasArrived {
            mermaid_source: bundle.mermaid_source,
            related_topics: bundle.related_topics,
        },
        PipelineEvent::ExtrasFailed { error } => {
            pipeline_warn!("Diagram fetch failed: {error}");
            Msg::ExtrasFailed {
                reason: error.to_string(),
            }
        }
        PipelineEvent::StallCheckDue { mark } => Msg::StallCheck { mark },
        PipelineEvent::ExplanationsListed { .. } | PipelineEvent::ListingFailed { .. } => {
            return None;
        }
    };
    Some(msg)
}

fn map_outline(outline: OutlineDto) -> OutlineSeed {
    OutlineSeed {
        sections: outline
            .sections
            .into_iter()
            .map(|section| OutlineSection {
                section_id: section.section_id,
                title: section.title,
                learning_goals: section.learning_goals,
            })
            .collect(),
    }
}

fn map_section(section: SectionDto) -> SectionEntry {
    SectionEntry {
        section_id: section.section_id,
        title: section.title,
        learning_goals: section.learning_goals,
        status: map_status(section.status),
    }
}

fn map_status(status: SectionStatusDto) -> SectionStatus {
    match status {
        SectionStatusDto::Waiting => SectionStatus::Waiting,
        SectionStatusDto::TextComplete => SectionStatus::TextComplete,
        SectionStatusDto::Complete => SectionStatus::Complete,
    }
}
