use std::time::Duration;

use hyperknow_core::{
    content_retry_delay, update, DocumentState, Effect, Msg, Phase, CONTENT_RETRY_LIMIT,
    STALL_CHECK_INTERVAL,
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

#[test]
fn submission_failure_raises_blocking_alert() {
    init_logging();
    let (state, _) = update(
        DocumentState::new(),
        Msg::QuerySubmitted {
            query: "Explain Neural Networks".to_string(),
            book_ids: Vec::new(),
            web_search: false,
            comments: None,
        },
    );
    let (state, effects) = update(
        state,
        Msg::SubmissionFailed {
            reason: "503 service unavailable".to_string(),
        },
    );
    assert!(effects.is_empty());
    let alert = state.view().alert.expect("alert");
    assert!(alert.contains("Could not start generation"));
}

#[test]
fn stream_error_keeps_last_phase() {
    init_logging();
    let state = writing_state();
    let (state, effects) = update(
        state,
        Msg::StreamClosed {
            reason: Some("transport error".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::SectionWriting);
    assert!(state.view().alert.expect("alert").contains("Lost connection"));
}

#[test]
fn clean_stream_end_raises_no_alert() {
    init_logging();
    let state = writing_state();
    let (state, _) = update(state, Msg::StreamClosed { reason: None });
    assert!(state.view().alert.is_none());
}

#[test]
fn content_retry_delays_double_up_to_the_cap() {
    assert_eq!(content_retry_delay(1), Duration::from_secs(5));
    assert_eq!(content_retry_delay(2), Duration::from_secs(10));
    assert_eq!(content_retry_delay(3), Duration::from_secs(20));
    assert_eq!(content_retry_delay(4), Duration::from_secs(40));
    assert_eq!(content_retry_delay(5), Duration::from_secs(60));
    assert_eq!(content_retry_delay(9), Duration::from_secs(60));
}

#[test]
fn failed_content_polls_back_off_then_stall() {
    init_logging();
    let mut state = writing_state();

    for attempt in 1..=CONTENT_RETRY_LIMIT {
        let (next, effects) = update(
            state,
            Msg::ContentPollFailed {
                reason: "timeout".to_string(),
            },
        );
        state = next;
        assert_eq!(
            effects,
            vec![Effect::FetchContent {
                conversation_id: "abc123".to_string(),
                delay: content_retry_delay(attempt),
            }],
            "attempt {attempt}"
        );
    }

    // One more failure exhausts the budget.
    let (state, effects) = update(
        state,
        Msg::ContentPollFailed {
            reason: "timeout".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.is_stalled());

    // Once stalled, neither loop reschedules.
    let (state, effects) = update(
        state,
        Msg::SectionPollFailed {
            reason: "timeout".to_string(),
        },
    );
    assert!(effects.is_empty());
    let (_, effects) = update(
        state,
        Msg::ContentPollArrived {
            markdown: "late".to_string(),
            is_complete: false,
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn successful_poll_resets_the_retry_budget() {
    init_logging();
    let state = writing_state();
    let (state, _) = update(
        state,
        Msg::ContentPollFailed {
            reason: "timeout".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ContentPollArrived {
            markdown: "# Intro".to_string(),
            is_complete: false,
        },
    );
    assert_eq!(state.content_retries(), 0);

    // The next failure starts from the base delay again.
    let (_, effects) = update(
        state,
        Msg::ContentPollFailed {
            reason: "timeout".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchContent {
            conversation_id: "abc123".to_string(),
            delay: content_retry_delay(1),
        }]
    );
}

#[test]
fn stall_check_fires_only_when_the_mark_sits_still() {
    init_logging();
    let state = writing_state();
    let mark = state.progress_mark();

    // Progress happened between scheduling and firing: reschedule.
    let (state, _) = update(
        state,
        Msg::ContentPollArrived {
            markdown: "# Intro".to_string(),
            is_complete: false,
        },
    );
    let (state, effects) = update(state, Msg::StallCheck { mark });
    assert_eq!(
        effects,
        vec![Effect::ScheduleStallCheck {
            mark: state.progress_mark(),
            delay: STALL_CHECK_INTERVAL,
        }]
    );

    // No progress since: the stall alert fires and polling stops.
    let current = state.progress_mark();
    let (state, effects) = update(state, Msg::StallCheck { mark: current });
    assert!(effects.is_empty());
    assert!(state.is_stalled());
}

#[test]
fn stall_check_is_inert_after_completion() {
    init_logging();
    let state = writing_state();
    let (state, _) = update(
        state,
        Msg::ContentPollArrived {
            markdown: "done".to_string(),
            is_complete: true,
        },
    );
    let mark = state.progress_mark();
    let (state, effects) = update(state, Msg::StallCheck { mark });
    assert!(effects.is_empty());
    assert!(!state.is_stalled());
}
