use std::fmt;

use serde::Deserialize;

/// Parameters for one generation job, as supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub book_ids: Vec<String>,
    pub web_search: bool,
    pub comments: Option<String>,
}

/// Accumulated article text plus the completion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub markdown: String,
    pub is_complete: bool,
}

/// Outline plus per-section status, as returned by the section-progress poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionProgressSnapshot {
    #[serde(default)]
    pub outline: Option<OutlineDto>,
    #[serde(default)]
    pub sections: Vec<SectionDto>,
    #[serde(default)]
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutlineDto {
    #[serde(default)]
    pub sections: Vec<OutlineSectionDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutlineSectionDto {
    pub section_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub learning_goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionDto {
    pub section_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub learning_goals: Vec<String>,
    #[serde(default)]
    pub status: SectionStatusDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatusDto {
    #[default]
    Waiting,
    TextComplete,
    Complete,
}

/// Post-completion concept diagram plus related topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBundle {
    /// Mermaid source with any markdown code fences already stripped.
    pub mermaid_source: String,
    pub related_topics: Vec<String>,
}

/// One previously generated article, as listed by the archive endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArticleSummary {
    pub conversation_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub estimated_reading_time: u32,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub character_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiFailure,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedBody,
    MissingConversationId,
    Stream,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::InvalidUrl => write!(f, "invalid url"),
            ApiFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailure::Timeout => write!(f, "timeout"),
            ApiFailure::Network => write!(f, "network error"),
            ApiFailure::MalformedBody => write!(f, "malformed response body"),
            ApiFailure::MissingConversationId => write!(f, "response lacks a conversation id"),
            ApiFailure::Stream => write!(f, "event stream error"),
        }
    }
}
