use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use pipeline_logging::{pipeline_error, pipeline_warn};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiSettings, ExplainApi, HttpExplainApi};
use crate::stream::{stream_generation, EventSink, GenerationStreamParams, StreamEvent};
use crate::types::{
    ApiError, DiagramBundle, ProgressSnapshot, QueryRequest, SectionProgressSnapshot,
};

enum PipelineCommand {
    Submit {
        user_id: String,
        request: QueryRequest,
    },
    OpenStream {
        params: GenerationStreamParams,
    },
    PollContent {
        user_id: String,
        conversation_id: String,
        delay: Duration,
    },
    PollSections {
        user_id: String,
        conversation_id: String,
        delay: Duration,
    },
    FetchArchive {
        user_id: String,
        conversation_id: String,
    },
    FetchExtras {
        user_id: String,
        conversation_id: String,
    },
    StallCheck {
        mark: u64,
        delay: Duration,
    },
    ListExplanations {
        user_id: String,
    },
}

/// Completion and progress notifications from the pipeline worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    JobAccepted { conversation_id: String },
    SubmissionFailed { error: ApiError },
    StreamMessage(String),
    StreamClosed { error: Option<ApiError> },
    ContentArrived(ProgressSnapshot),
    ContentFailed { error: ApiError },
    SectionsArrived(SectionProgressSnapshot),
    SectionsFailed { error: ApiError },
    ArchiveArrived { markdown: String },
    ArchiveFailed { error: ApiError },
    ExtrasArrived(DiagramBundle),
    ExtrasFailed { error: ApiError },
    StallCheckDue { mark: u64 },
    ExplanationsListed { articles: Vec<crate::types::ArticleSummary> },
    ListingFailed { error: ApiError },
}

/// Owns the worker thread and tokio runtime all network tasks run on.
///
/// Commands go in over a channel; events come back out through [`try_recv`].
/// Dropping (or [`shutdown`]) cancels every pending timer and in-flight
/// stream without notifying the backend.
///
/// [`try_recv`]: PipelineHandle::try_recv
/// [`shutdown`]: PipelineHandle::shutdown
pub struct PipelineHandle {
    cmd_tx: mpsc::Sender<PipelineCommand>,
    event_rx: mpsc::Receiver<PipelineEvent>,
    cancel: CancellationToken,
}

impl PipelineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let api: Arc<dyn ExplainApi> = Arc::new(HttpExplainApi::new(settings.clone())?);
        Ok(Self::with_api(api, settings))
    }

    pub fn with_api(api: Arc<dyn ExplainApi>, settings: ApiSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PipelineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    pipeline_error!("pipeline runtime failed to start: {err}");
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                if worker_cancel.is_cancelled() {
                    break;
                }
                let api = api.clone();
                let settings = settings.clone();
                let event_tx = event_tx.clone();
                let cancel = worker_cancel.clone();
                runtime.spawn(async move {
                    handle_command(api.as_ref(), &settings, command, &event_tx, &cancel).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx,
            cancel,
        }
    }

    pub fn submit(&self, user_id: impl Into<String>, request: QueryRequest) {
        self.send(PipelineCommand::Submit {
            user_id: user_id.into(),
            request,
        });
    }

    pub fn open_stream(&self, params: GenerationStreamParams) {
        self.send(PipelineCommand::OpenStream { params });
    }

    pub fn poll_content(
        &self,
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        delay: Duration,
    ) {
        self.send(PipelineCommand::PollContent {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            delay,
        });
    }

    pub fn poll_sections(
        &self,
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        delay: Duration,
    ) {
        self.send(PipelineCommand::PollSections {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            delay,
        });
    }

    pub fn fetch_archive(&self, user_id: impl Into<String>, conversation_id: impl Into<String>) {
        self.send(PipelineCommand::FetchArchive {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
        });
    }

    pub fn fetch_extras(&self, user_id: impl Into<String>, conversation_id: impl Into<String>) {
        self.send(PipelineCommand::FetchExtras {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
        });
    }

    pub fn schedule_stall_check(&self, mark: u64, delay: Duration) {
        self.send(PipelineCommand::StallCheck { mark, delay });
    }

    pub fn list_explanations(&self, user_id: impl Into<String>) {
        self.send(PipelineCommand::ListExplanations {
            user_id: user_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<PipelineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Cancels all pending timers and in-flight requests.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn send(&self, command: PipelineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ChannelEventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: StreamEvent) {
        let event = match event {
            StreamEvent::Message(message) => PipelineEvent::StreamMessage(message),
            StreamEvent::Closed { error } => PipelineEvent::StreamClosed { error },
        };
        let _ = self.tx.send(event);
    }
}

/// Sleeps for `delay` unless cancelled first. Returns whether to proceed.
async fn wait(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn handle_command(
    api: &dyn ExplainApi,
    settings: &ApiSettings,
    command: PipelineCommand,
    event_tx: &mpsc::Sender<PipelineEvent>,
    cancel: &CancellationToken,
) {
    let event = match command {
        PipelineCommand::Submit { user_id, request } => {
            match api.submit_query(&user_id, &request).await {
                Ok(conversation_id) => PipelineEvent::JobAccepted { conversation_id },
                Err(error) => PipelineEvent::SubmissionFailed { error },
            }
        }
        PipelineCommand::OpenStream { params } => {
            let sink = ChannelEventSink {
                tx: event_tx.clone(),
            };
            if let Err(error) = stream_generation(settings, &params, cancel, &sink).await {
                pipeline_warn!(
                    "generation stream for conversation {} ended: {error}",
                    params.conversation_id
                );
            }
            return;
        }
        PipelineCommand::PollContent {
            user_id,
            conversation_id,
            delay,
        } => {
            if !wait(delay, cancel).await {
                return;
            }
            match api.fetch_progress(&user_id, &conversation_id).await {
                Ok(snapshot) => PipelineEvent::ContentArrived(snapshot),
                Err(error) => PipelineEvent::ContentFailed { error },
            }
        }
        PipelineCommand::PollSections {
            user_id,
            conversation_id,
            delay,
        } => {
            if !wait(delay, cancel).await {
                return;
            }
            match api.fetch_section_progress(&user_id, &conversation_id).await {
                Ok(snapshot) => PipelineEvent::SectionsArrived(snapshot),
                Err(error) => PipelineEvent::SectionsFailed { error },
            }
        }
        PipelineCommand::FetchArchive {
            user_id,
            conversation_id,
        } => match api.fetch_article(&user_id, &conversation_id).await {
            Ok(markdown) => PipelineEvent::ArchiveArrived { markdown },
            Err(error) => PipelineEvent::ArchiveFailed { error },
        },
        PipelineCommand::FetchExtras {
            user_id,
            conversation_id,
        } => match api.fetch_diagram_and_topics(&user_id, &conversation_id).await {
            Ok(bundle) => PipelineEvent::ExtrasArrived(bundle),
            Err(error) => PipelineEvent::ExtrasFailed { error },
        },
        PipelineCommand::StallCheck { mark, delay } => {
            if !wait(delay, cancel).await {
                return;
            }
            PipelineEvent::StallCheckDue { mark }
        }
        PipelineCommand::ListExplanations { user_id } => {
            match api.list_explanations(&user_id).await {
                Ok(articles) => PipelineEvent::ExplanationsListed { articles },
                Err(error) => PipelineEvent::ListingFailed { error },
            }
        }
    };
    let _ = event_tx.send(event);
}
