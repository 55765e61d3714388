//! Hyperknow pipeline: remote generation API client and effect execution.
mod api;
mod runtime;
mod store;
mod stream;
mod types;

pub use api::{ApiSettings, ExplainApi, HttpExplainApi, BOOK_ID_SEPARATOR};
pub use runtime::{PipelineEvent, PipelineHandle};
pub use store::{article_filename, ArticleMeta, ArticleStore, StoreError, StoredArticle};
pub use stream::{stream_generation, EventSink, GenerationStreamParams, SseLineDecoder, StreamEvent};
pub use types::{
    ApiError, ApiFailure, ArticleSummary, DiagramBundle, OutlineDto, OutlineSectionDto,
    ProgressSnapshot, QueryRequest, SectionDto, SectionProgressSnapshot, SectionStatusDto,
};
