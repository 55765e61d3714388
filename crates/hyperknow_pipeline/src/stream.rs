use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::api::{map_reqwest_error, ApiSettings};
use crate::types::{ApiError, ApiFailure};

/// One observation from the generation event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One complete server-sent message payload.
    Message(String),
    /// The stream ended. `error` is set when the transport failed; the
    /// stream is never reopened automatically.
    Closed { error: Option<ApiError> },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: StreamEvent);
}

/// Query-string parameters for `GET /generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStreamParams {
    pub user_id: String,
    pub conversation_id: String,
    pub query: String,
    pub book_ids: Vec<String>,
    pub web_search: bool,
}

/// Incremental server-sent-event decoder.
///
/// Fed raw transport chunks, yields complete message payloads. Multi-line
/// `data:` fields within one event are joined with `\n`; comment and
/// non-data fields are ignored.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut messages = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(message) = self.take_line(&String::from_utf8_lossy(&line)) {
                messages.push(message);
            }
        }
        messages
    }

    /// Flushes a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).to_string();
            let trimmed = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(message) = self.take_line(trimmed) {
                return Some(message);
            }
        }
        self.dispatch()
    }

    fn take_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.strip_prefix(' ').unwrap_or(payload);
            self.data_lines.push(payload.to_string());
        }
        // event:, id: and retry: fields carry no payload for this protocol.
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data_lines).join("\n"))
    }
}

/// Consumes the generation event stream until it ends, fails, or `cancel`
/// fires. Messages and the closing event go to `sink`; cancellation emits
/// nothing further.
pub async fn stream_generation(
    settings: &ApiSettings,
    params: &GenerationStreamParams,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
) -> Result<(), ApiError> {
    // The stream stays open for the whole generation; only the connect
    // phase gets a timeout.
    let client = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;

    let mut endpoint = url::Url::parse(&settings.base_url)
        .map_err(|err| ApiError::new(ApiFailure::InvalidUrl, err.to_string()))?;
    endpoint.set_path("/generate");
    endpoint
        .query_pairs_mut()
        .append_pair("query", &params.query)
        .append_pair("user_id", &params.user_id)
        .append_pair("conversation_id", &params.conversation_id)
        .append_pair("book_ids", &params.book_ids.join(crate::BOOK_ID_SEPARATOR))
        .append_pair("websearch", if params.web_search { "true" } else { "false" });

    let response = client
        .get(endpoint)
        .send()
        .await
        .map_err(map_reqwest_error)?;
    let status = response.status();
    if !status.is_success() {
        let error = ApiError::new(ApiFailure::HttpStatus(status.as_u16()), status.to_string());
        sink.emit(StreamEvent::Closed {
            error: Some(error.clone()),
        });
        return Err(error);
    }

    let mut decoder = SseLineDecoder::new();
    let mut body = response.bytes_stream();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for message in decoder.feed(&bytes) {
                        sink.emit(StreamEvent::Message(message));
                    }
                }
                Some(Err(err)) => {
                    let error = ApiError::new(ApiFailure::Stream, err.to_string());
                    sink.emit(StreamEvent::Closed {
                        error: Some(error.clone()),
                    });
                    return Err(error);
                }
                None => {
                    if let Some(message) = decoder.finish() {
                        sink.emit(StreamEvent::Message(message));
                    }
                    sink.emit(StreamEvent::Closed { error: None });
                    return Ok(());
                }
            },
        }
    }
}
