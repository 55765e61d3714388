use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{
    ApiError, ApiFailure, ArticleSummary, DiagramBundle, ProgressSnapshot, QueryRequest,
    SectionProgressSnapshot,
};

/// Separator the backend expects between book ids in a single field.
pub const BOOK_ID_SEPARATOR: &str = "///";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://backend-ai-cloud-explains.onrender.com".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The remote generation service, one method per endpoint.
///
/// Every method is one-shot; retry policy belongs to the caller.
#[async_trait::async_trait]
pub trait ExplainApi: Send + Sync {
    /// Starts a job and returns its conversation id.
    async fn submit_query(
        &self,
        user_id: &str,
        request: &QueryRequest,
    ) -> Result<String, ApiError>;

    /// Latest accumulated article text plus completion flag.
    async fn fetch_progress(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<ProgressSnapshot, ApiError>;

    /// Outline and per-section status.
    async fn fetch_section_progress(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<SectionProgressSnapshot, ApiError>;

    /// Finished article text (archive read path).
    async fn fetch_article(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<String, ApiError>;

    /// Post-completion concept diagram and related topics.
    async fn fetch_diagram_and_topics(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<DiagramBundle, ApiError>;

    /// All previously generated articles for this user.
    async fn list_explanations(&self, user_id: &str) -> Result<Vec<ArticleSummary>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpExplainApi {
    client: reqwest::Client,
    settings: ApiSettings,
}

#[derive(Debug, Serialize)]
struct SaveQueryBody<'a> {
    query: &'a str,
    user_id: &'a str,
    book_ids: String,
    websearch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_comments: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SaveQueryReply {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConversationBody<'a> {
    user_id: &'a str,
    conversation_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProgressReply {
    #[serde(default)]
    completed_sections: String,
    #[serde(default)]
    is_complete: bool,
}

#[derive(Debug, Deserialize)]
struct DiagramReply {
    #[serde(default)]
    diagram: Option<String>,
    #[serde(default)]
    related_topics: Option<RelatedTopicsReply>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopicsReply {
    #[serde(default)]
    related_concepts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExplanationsReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ExplanationsData>,
}

#[derive(Debug, Deserialize)]
struct ExplanationsData {
    #[serde(default)]
    articles: Vec<ArticleSummary>,
}

impl HttpExplainApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ApiFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        response
            .json::<R>()
            .await
            .map_err(|err| ApiError::new(ApiFailure::MalformedBody, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ExplainApi for HttpExplainApi {
    async fn submit_query(
        &self,
        user_id: &str,
        request: &QueryRequest,
    ) -> Result<String, ApiError> {
        let body = SaveQueryBody {
            query: &request.query,
            user_id,
            book_ids: request.book_ids.join(BOOK_ID_SEPARATOR),
            websearch: request.web_search,
            additional_comments: request.comments.as_deref(),
        };
        let reply: SaveQueryReply = self.post_json("/save_query", &body).await?;
        match reply.conversation_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ApiError::new(
                ApiFailure::MissingConversationId,
                reply.error.unwrap_or_else(|| "no error detail".to_string()),
            )),
        }
    }

    async fn fetch_progress(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<ProgressSnapshot, ApiError> {
        let body = ConversationBody {
            user_id,
            conversation_id,
        };
        let reply: ProgressReply = self.post_json("/get_progress", &body).await?;
        Ok(ProgressSnapshot {
            markdown: reply.completed_sections,
            is_complete: reply.is_complete,
        })
    }

    async fn fetch_section_progress(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<SectionProgressSnapshot, ApiError> {
        let body = ConversationBody {
            user_id,
            conversation_id,
        };
        self.post_json("/get_section_progress", &body).await
    }

    async fn fetch_article(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/article"))
            .query(&[("user_id", user_id), ("conversation_id", conversation_id)])
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ApiFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        response
            .text()
            .await
            .map_err(|err| ApiError::new(ApiFailure::MalformedBody, err.to_string()))
    }

    async fn fetch_diagram_and_topics(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<DiagramBundle, ApiError> {
        let body = ConversationBody {
            user_id,
            conversation_id,
        };
        let reply: DiagramReply = self.post_json("/generate_diagram_and_topics", &body).await?;
        Ok(DiagramBundle {
            mermaid_source: strip_mermaid_fences(reply.diagram.as_deref().unwrap_or_default()),
            related_topics: reply
                .related_topics
                .map(|topics| topics.related_concepts)
                .unwrap_or_default(),
        })
    }

    async fn list_explanations(&self, user_id: &str) -> Result<Vec<ArticleSummary>, ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            user_id: &'a str,
        }
        let reply: ExplanationsReply = self
            .post_json("/get_generated_explanations", &Body { user_id })
            .await?;
        if !reply.success {
            return Err(ApiError::new(
                ApiFailure::MalformedBody,
                reply
                    .message
                    .unwrap_or_else(|| "listing rejected".to_string()),
            ));
        }
        Ok(reply.data.map(|data| data.articles).unwrap_or_default())
    }
}

/// The backend wraps diagram source in a markdown code fence; the renderer
/// wants bare mermaid text.
fn strip_mermaid_fences(diagram: &str) -> String {
    diagram
        .replace("```mermaid\n", "")
        .replace("\n```", "")
        .trim()
        .to_string()
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailure::Timeout, err.to_string());
    }
    ApiError::new(ApiFailure::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::strip_mermaid_fences;

    #[test]
    fn fences_are_stripped_from_diagram_source() {
        let fenced = "```mermaid\ngraph TD\nA-->B\n```";
        assert_eq!(strip_mermaid_fences(fenced), "graph TD\nA-->B");
    }

    #[test]
    fn bare_source_passes_through() {
        assert_eq!(strip_mermaid_fences("graph TD"), "graph TD");
        assert_eq!(strip_mermaid_fences(""), "");
    }
}
