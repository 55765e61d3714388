use std::time::Duration;

use crate::{Alert, ConceptExtras, DocumentState, Effect, Msg, Phase, QuerySpec};

/// Fixed delay between content polls while generation is running.
pub const CONTENT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Fixed delay between section-progress polls.
pub const SECTION_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Failed content polls are retried this many times before giving up.
pub const CONTENT_RETRY_LIMIT: u32 = 5;
/// How long the progress mark may sit still before the stall alert fires.
pub const STALL_CHECK_INTERVAL: Duration = Duration::from_secs(180);

const MAX_CONTENT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Backoff for the n-th consecutive failed content poll (1-based):
/// 5s, 10s, 20s, 40s, then capped at 60s.
pub fn content_retry_delay(attempt: u32) -> Duration {
    let doubled = CONTENT_POLL_INTERVAL.saturating_mul(1 << attempt.saturating_sub(1).min(4));
    doubled.min(MAX_CONTENT_RETRY_DELAY)
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: DocumentState, msg: Msg) -> (DocumentState, Vec<Effect>) {
    let effects = match msg {
        Msg::QuerySubmitted {
            query,
            book_ids,
            web_search,
            comments,
        } => {
            let query = query.trim().to_string();
            if query.is_empty()
                || state.phase() != Phase::Idle
                || state.conversation_id().is_some()
                || state.is_archive()
            {
                return (state, Vec::new());
            }
            state.begin_submission(QuerySpec {
                query: query.clone(),
                book_ids: book_ids.clone(),
                web_search,
                comments: comments.clone(),
            });
            vec![Effect::SubmitQuery {
                query,
                book_ids,
                web_search,
                comments,
            }]
        }
        Msg::JobCreated { conversation_id } => {
            let Some(spec) = state.pending_query().cloned() else {
                return (state, Vec::new());
            };
            if state.conversation_id().is_some() {
                return (state, Vec::new());
            }
            state.set_conversation(conversation_id.clone());
            vec![
                Effect::PersistSession {
                    conversation_id: conversation_id.clone(),
                },
                Effect::OpenEventStream {
                    conversation_id,
                    query: spec.query,
                    book_ids: spec.book_ids,
                    web_search: spec.web_search,
                },
            ]
        }
        Msg::SubmissionFailed { reason } => {
            state.set_alert(Alert::SubmissionFailed(reason));
            Vec::new()
        }
        Msg::StreamMessage(line) => {
            let next = crate::phase_for_message(&line);
            state.push_stream_line(line);
            match next {
                Some(phase) => {
                    let advanced = state.advance_phase(phase);
                    if advanced && phase == Phase::SectionWriting {
                        start_polling(&mut state)
                    } else {
                        Vec::new()
                    }
                }
                None => Vec::new(),
            }
        }
        Msg::StreamClosed { reason } => {
            // Not retried; the last known phase stays on screen.
            if let Some(reason) = reason {
                if !state.is_complete() {
                    state.set_alert(Alert::StreamLost(reason));
                }
            }
            Vec::new()
        }
        Msg::ContentPollArrived {
            markdown,
            is_complete,
        } => {
            if state.is_complete() || state.is_archive() {
                // Polling already terminated for this conversation.
                return (state, Vec::new());
            }
            state.replace_snapshot(markdown, is_complete);
            state.advance_phase(Phase::StreamingArticle);
            let Some(conversation_id) = state.conversation_id().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            if is_complete {
                state.advance_phase(Phase::Complete);
                vec![Effect::FetchExtras { conversation_id }]
            } else if state.is_stalled() {
                Vec::new()
            } else {
                vec![Effect::FetchContent {
                    conversation_id,
                    delay: CONTENT_POLL_INTERVAL,
                }]
            }
        }
        Msg::ContentPollFailed { reason: _ } => {
            if state.is_complete() || state.is_archive() || state.is_stalled() {
                return (state, Vec::new());
            }
            let attempt = state.note_content_failure();
            if attempt > CONTENT_RETRY_LIMIT {
                state.set_alert(Alert::Stalled);
                Vec::new()
            } else {
                match state.conversation_id() {
                    Some(conversation_id) => vec![Effect::FetchContent {
                        conversation_id: conversation_id.to_owned(),
                        delay: content_retry_delay(attempt),
                    }],
                    None => Vec::new(),
                }
            }
        }
        Msg::SectionPollArrived {
            outline,
            sections,
            is_complete,
        } => {
            if let Some(outline) = outline {
                state.seed_outline(&outline);
            }
            state.merge_section_update(&sections);
            if is_complete || state.is_archive() || state.is_stalled() {
                Vec::new()
            } else {
                match state.conversation_id() {
                    Some(conversation_id) => vec![Effect::FetchSections {
                        conversation_id: conversation_id.to_owned(),
                        delay: SECTION_POLL_INTERVAL,
                    }],
                    None => Vec::new(),
                }
            }
        }
        Msg::SectionPollFailed { reason: _ } => {
            // Unlike the content poller this loop reschedules unconditionally
            // while live; the error is logged by the caller.
            if state.is_archive() || state.is_stalled() || state.is_complete() {
                return (state, Vec::new());
            }
            match state.conversation_id() {
                Some(conversation_id) => vec![Effect::FetchSections {
                    conversation_id: conversation_id.to_owned(),
                    delay: SECTION_POLL_INTERVAL,
                }],
                None => Vec::new(),
            }
        }
        Msg::SectionToggled { section_id } => {
            state.toggle_expanded(section_id);
            Vec::new()
        }
        Msg::ArchiveOpened { conversation_id } => {
            state.reset_for_archive(conversation_id.clone());
            vec![
                Effect::FetchArchivedArticle {
                    conversation_id: conversation_id.clone(),
                },
                // Archive views fetch section progress at most once.
                Effect::FetchSections {
                    conversation_id,
                    delay: Duration::ZERO,
                },
            ]
        }
        Msg::ArchiveLoaded { markdown } => {
            state.install_archived(markdown);
            Vec::new()
        }
        Msg::ArchiveLoadFailed { reason } => {
            state.set_alert(Alert::ArchiveUnavailable(reason));
            Vec::new()
        }
        Msg::ExtrasArrived {
            mermaid_source,
            related_topics,
        } => {
            state.set_extras(ConceptExtras {
                mermaid_source,
                related_topics,
            });
            Vec::new()
        }
        Msg::ExtrasFailed { reason: _ } => Vec::new(),
        Msg::StallCheck { mark } => {
            if state.is_complete() || state.is_archive() || state.is_stalled() {
                Vec::new()
            } else if state.progress_mark() == mark {
                state.set_alert(Alert::Stalled);
                Vec::new()
            } else {
                vec![Effect::ScheduleStallCheck {
                    mark: state.progress_mark(),
                    delay: STALL_CHECK_INTERVAL,
                }]
            }
        }
        Msg::ResumeConversation { conversation_id } => {
            if state.phase() != Phase::Idle || state.conversation_id().is_some() {
                return (state, Vec::new());
            }
            state.resume_conversation(conversation_id);
            start_polling(&mut state)
        }
    };

    (state, effects)
}

/// Effects that kick off both polling loops plus the stall watchdog.
/// Emitted exactly once per conversation, on entering the writing phase.
fn start_polling(state: &mut DocumentState) -> Vec<Effect> {
    let Some(conversation_id) = state.conversation_id().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    state.clear_snapshot();
    vec![
        Effect::FetchContent {
            conversation_id: conversation_id.clone(),
            delay: Duration::ZERO,
        },
        Effect::FetchSections {
            conversation_id,
            delay: Duration::ZERO,
        },
        Effect::ScheduleStallCheck {
            mark: state.progress_mark(),
            delay: STALL_CHECK_INTERVAL,
        },
    ]
}
