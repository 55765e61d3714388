use std::time::Duration;

use hyperknow_core::{
    update, DocumentState, Effect, Msg, OutlineSeed, OutlineSection, SectionEntry, SectionStatus,
    SECTION_POLL_INTERVAL,
};

fn init_logging() {
    pipeline_logging::initialize_for_tests();
}

const WRITING_LINE: &str = "Starting Article writing for user 'u1' in conversation 'abc123'";

fn writing_state() -> DocumentState {
    let (state, _) = update(
        DocumentState::new(),
        Msg::QuerySubmitted {
            query: "Explain Neural Networks".to_string(),
            book_ids: Vec::new(),
            web_search: true,
            comments: None,
        },
    );
    let (state, _) = update(
        state,
        Msg::JobCreated {
            conversation_id: "abc123".to_string(),
        },
    );
    let (state, _) = update(state, Msg::StreamMessage(WRITING_LINE.to_string()));
    state
}

fn outline(ids: &[(&str, &str)]) -> OutlineSeed {
    OutlineSeed {
        sections: ids
            .iter()
            .map(|(id, title)| OutlineSection {
                section_id: id.to_string(),
                title: title.to_string(),
                learning_goals: vec![format!("understand {title}")],
            })
            .collect(),
    }
}

fn section(id: &str, status: SectionStatus) -> SectionEntry {
    SectionEntry {
        section_id: id.to_string(),
        title: format!("Section {id}"),
        learning_goals: Vec::new(),
        status,
    }
}

#[test]
fn outline_seeds_once_and_defaults_to_waiting() {
    init_logging();
    let state = writing_state();
    let (state, effects) = update(
        state,
        Msg::SectionPollArrived {
            outline: Some(outline(&[("s1", "Intro"), ("s2", "Depth")])),
            sections: Vec::new(),
            is_complete: false,
        },
    );
    assert_eq!(state.sections().len(), 2);
    assert!(state
        .sections()
        .iter()
        .all(|s| s.status == SectionStatus::Waiting));
    assert_eq!(
        effects,
        vec![Effect::FetchSections {
            conversation_id: "abc123".to_string(),
            delay: SECTION_POLL_INTERVAL,
        }]
    );

    // A later response with a different outline cannot reset the seed.
    let (state, _) = update(
        state,
        Msg::SectionPollArrived {
            outline: Some(outline(&[("zz", "Other")])),
            sections: Vec::new(),
            is_complete: false,
        },
    );
    let ids: Vec<_> = state.sections().iter().map(|s| s.section_id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);
}

#[test]
fn status_update_preserves_order_and_untouched_entries() {
    init_logging();
    let state = writing_state();
    let (state, _) = update(
        state,
        Msg::SectionPollArrived {
            outline: Some(outline(&[("a", "A"), ("b", "B"), ("c", "C")])),
            sections: Vec::new(),
            is_complete: false,
        },
    );
    let before_a = state.sections()[0].clone();
    let before_c = state.sections()[2].clone();

    let (state, _) = update(
        state,
        Msg::SectionPollArrived {
            outline: None,
            sections: vec![section("b", SectionStatus::TextComplete)],
            is_complete: false,
        },
    );
    assert_eq!(state.sections()[0], before_a);
    assert_eq!(state.sections()[1].status, SectionStatus::TextComplete);
    assert_eq!(state.sections()[2], before_c);
}

#[test]
fn expansion_survives_status_updates() {
    init_logging();
    let state = writing_state();
    let (state, _) = update(
        state,
        Msg::SectionPollArrived {
            outline: Some(outline(&[("s1", "Intro")])),
            sections: vec![section("s1", SectionStatus::Waiting)],
            is_complete: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::SectionToggled {
            section_id: "s1".to_string(),
        },
    );
    assert!(state.view().sections[0].expanded);

    let (state, _) = update(
        state,
        Msg::SectionPollArrived {
            outline: None,
            sections: vec![section("s1", SectionStatus::Complete)],
            is_complete: false,
        },
    );
    let row = &state.view().sections[0];
    assert!(row.expanded);
    assert_eq!(row.status, SectionStatus::Complete);

    // Toggling again collapses.
    let (state, _) = update(
        state,
        Msg::SectionToggled {
            section_id: "s1".to_string(),
        },
    );
    assert!(!state.view().sections[0].expanded);
}

#[test]
fn section_polling_stops_on_completion() {
    init_logging();
    let state = writing_state();
    let (_, effects) = update(
        state,
        Msg::SectionPollArrived {
            outline: Some(outline(&[("s1", "Intro")])),
            sections: vec![section("s1", SectionStatus::Complete)],
            is_complete: true,
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn section_poll_failure_reschedules_on_fixed_delay() {
    init_logging();
    let state = writing_state();
    let (_, effects) = update(
        state,
        Msg::SectionPollFailed {
            reason: "connection reset".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchSections {
            conversation_id: "abc123".to_string(),
            delay: SECTION_POLL_INTERVAL,
        }]
    );
}

#[test]
fn archive_view_fetches_sections_at_most_once() {
    init_logging();
    let (state, effects) = update(
        DocumentState::new(),
        Msg::ArchiveOpened {
            conversation_id: "old42".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::FetchArchivedArticle {
                conversation_id: "old42".to_string(),
            },
            Effect::FetchSections {
                conversation_id: "old42".to_string(),
                delay: Duration::ZERO,
            },
        ]
    );

    // Regardless of the completion flag, an archive view never re-polls.
    let (state, effects) = update(
        state,
        Msg::SectionPollArrived {
            outline: Some(outline(&[("s1", "Intro")])),
            sections: vec![section("s1", SectionStatus::Waiting)],
            is_complete: false,
        },
    );
    assert!(effects.is_empty());
    let (_, effects) = update(
        state,
        Msg::SectionPollFailed {
            reason: "boom".to_string(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn archived_article_installs_as_complete() {
    init_logging();
    let (state, _) = update(
        DocumentState::new(),
        Msg::ArchiveOpened {
            conversation_id: "old42".to_string(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::ArchiveLoaded {
            markdown: "# Archived".to_string(),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.is_complete);
    assert!(!view.show_placeholder);
    assert_eq!(view.markdown, "# Archived");
}
