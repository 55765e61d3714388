use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use hyperknow_core::{article_stats, update, DocumentState, Msg};
use hyperknow_pipeline::{ApiSettings, ArticleMeta, ArticleStore, PipelineEvent, PipelineHandle};
use pipeline_logging::pipeline_warn;

use crate::cli::{Command, Invocation};
use crate::effects::{map_event, EffectRunner};
use crate::render::SnapshotRenderer;
use crate::session;

const EVENT_LOOP_IDLE: Duration = Duration::from_millis(20);
// How long a finished document waits for the diagram payload.
const EXTRAS_GRACE: Duration = Duration::from_secs(10);
const ARCHIVE_GRACE: Duration = Duration::from_secs(2);

pub fn run(invocation: Invocation) -> Result<()> {
    let session_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut session = session::load_session(&session_dir);

    let user_id = invocation
        .user_id
        .clone()
        .or_else(|| session.user_id.clone())
        .ok_or_else(|| anyhow!("no user id known; pass --user <id> once"))?;
    if session.user_id.as_deref() != Some(user_id.as_str()) {
        session.user_id = Some(user_id.clone());
        session::save_session(&session_dir, &session);
    }

    let mut settings = ApiSettings::default();
    if let Ok(base_url) = std::env::var("HYPERKNOW_API_BASE") {
        settings.base_url = base_url;
    }
    let handle = PipelineHandle::new(settings).map_err(|err| anyhow!("{err}"))?;

    if matches!(invocation.command, Command::List) {
        return run_list(handle, &user_id);
    }

    let archive_mode = matches!(invocation.command, Command::Archive { .. });
    let (initial_msg, topic) = match invocation.command {
        Command::Ask {
            query,
            book_ids,
            web_search,
            comments,
        } => (
            Msg::QuerySubmitted {
                query: query.clone(),
                book_ids,
                web_search,
                comments,
            },
            query,
        ),
        Command::Resume => {
            let conversation_id = session
                .conversation_id
                .clone()
                .ok_or_else(|| anyhow!("no conversation to resume"))?;
            pipeline_logging::set_log_conversation(Some(&conversation_id));
            let topic = format!("resumed {conversation_id}");
            (Msg::ResumeConversation { conversation_id }, topic)
        }
        Command::Archive { conversation_id } => {
            pipeline_logging::set_log_conversation(Some(&conversation_id));
            let topic = format!("archive {conversation_id}");
            (Msg::ArchiveOpened { conversation_id }, topic)
        }
        Command::List => unreachable!("handled above"),
    };

    let runner = EffectRunner::new(handle, user_id, session_dir.clone());
    let renderer = SnapshotRenderer::new(session_dir.join("article_preview.html"));
    let store = ArticleStore::new(session_dir.join("articles"));

    let mut state = DocumentState::new();
    dispatch(&mut state, initial_msg, &runner);

    let mut completed_at: Option<Instant> = None;
    let mut extras_settled = false;
    loop {
        while let Some(event) = runner.handle().try_recv() {
            if matches!(
                event,
                PipelineEvent::ExtrasArrived(_) | PipelineEvent::ExtrasFailed { .. }
            ) {
                extras_settled = true;
            }
            if let Some(msg) = map_event(event) {
                dispatch(&mut state, msg, &runner);
            }
        }

        if state.consume_dirty() {
            renderer.render(&state.view());
        }

        if state.is_stalled() {
            runner.handle().shutdown();
            bail!("generation stalled; try --resume later");
        }
        if !state.is_complete() {
            if let Some(alert) = state.view().alert {
                // Alerts raised before any article content exists are fatal;
                // a dropped stream mid-article keeps polling instead.
                if !state.phase().has_article_view() || state.is_archive() {
                    runner.handle().shutdown();
                    bail!(alert);
                }
            }
        }

        if state.is_complete() {
            let since = *completed_at.get_or_insert_with(Instant::now);
            let grace = if archive_mode { ARCHIVE_GRACE } else { EXTRAS_GRACE };
            if (!archive_mode && extras_settled) || since.elapsed() >= grace {
                if state.consume_dirty() {
                    renderer.render(&state.view());
                }
                break;
            }
        }

        thread::sleep(EVENT_LOOP_IDLE);
    }

    if !archive_mode {
        let stats = article_stats(state.markdown());
        let meta = ArticleMeta {
            topic,
            conversation_id: state.conversation_id().unwrap_or_default().to_string(),
            generated_utc: Utc::now().to_rfc3339(),
            word_count: stats.words as u32,
        };
        match store.save(&meta, state.markdown()) {
            Ok(stored) => println!("Saved article to {}", stored.path.display()),
            Err(err) => pipeline_warn!("Failed to save article: {err}"),
        }
    }
    println!("Preview: {}", renderer.preview_path().display());

    runner.handle().shutdown();
    Ok(())
}

fn run_list(handle: PipelineHandle, user_id: &str) -> Result<()> {
    handle.list_explanations(user_id);
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        if let Some(event) = handle.try_recv() {
            match event {
                PipelineEvent::ExplanationsListed { articles } => {
                    if articles.is_empty() {
                        println!("No generated articles yet.");
                    }
                    for article in articles {
                        println!(
                            "{}  {}  {} words  ({})",
                            article.conversation_id,
                            article.topic,
                            article.word_count,
                            article.generated_at,
                        );
                    }
                    return Ok(());
                }
                PipelineEvent::ListingFailed { error } => {
                    bail!("could not list articles: {error}");
                }
                _ => {}
            }
        }
        if Instant::now() >= deadline {
            bail!("timed out listing articles");
        }
        thread::sleep(EVENT_LOOP_IDLE);
    }
}

fn dispatch(state: &mut DocumentState, msg: Msg, runner: &EffectRunner) {
    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;
    runner.run(effects);
}
