use std::fs;
use std::path::PathBuf;

use hyperknow_core::{DocumentViewModel, Phase, Screen, SectionStatus};
use pipeline_logging::pipeline_warn;
use pulldown_cmark::{html, Options, Parser};

/// Writes each snapshot to an HTML preview file and prints a status line.
///
/// Rendering is a pure function of the latest view model; failures are
/// logged and never propagate into the polling pipeline.
pub struct SnapshotRenderer {
    preview_path: PathBuf,
}

impl SnapshotRenderer {
    pub fn new(preview_path: PathBuf) -> Self {
        Self { preview_path }
    }

    pub fn preview_path(&self) -> &PathBuf {
        &self.preview_path
    }

    pub fn render(&self, view: &DocumentViewModel) {
        println!("{}", status_line(view));
        if view.screen != Screen::Article {
            return;
        }
        if let Err(err) = fs::write(&self.preview_path, html_for(view)) {
            pipeline_warn!("Failed to write preview {:?}: {}", self.preview_path, err);
        }
    }
}

/// Renders the whole markdown snapshot to a self-contained HTML document.
pub fn html_for(view: &DocumentViewModel) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_MATH);

    let mut body = String::with_capacity(view.markdown.len() * 2);
    html::push_html(&mut body, Parser::new_ext(&view.markdown, options));

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n");
    page.push_str(&body);
    if view.show_placeholder {
        page.push_str("<div class=\"generating\">Generating&hellip;</div>\n");
    }
    if let Some(extras) = &view.extras {
        if !extras.mermaid_source.is_empty() {
            page.push_str("<pre class=\"mermaid\">\n");
            page.push_str(&extras.mermaid_source);
            page.push_str("\n</pre>\n");
        }
        if !extras.related_topics.is_empty() {
            page.push_str("<ul class=\"related-topics\">\n");
            for topic in &extras.related_topics {
                page.push_str(&format!("<li>{topic}</li>\n"));
            }
            page.push_str("</ul>\n");
        }
    }
    page.push_str("</body>\n</html>\n");
    page
}

pub fn status_line(view: &DocumentViewModel) -> String {
    let phase = match (view.archive, view.phase) {
        (true, _) => "archive",
        (_, Phase::Idle) => "submitting",
        (_, Phase::SourceCollecting) => "collecting sources",
        (_, Phase::OutlineGenerating) => "generating outline",
        (_, Phase::SectionWriting) => "writing sections",
        (_, Phase::StreamingArticle) => "streaming article",
        (_, Phase::Complete) => "complete",
    };

    let done = view
        .sections
        .iter()
        .filter(|s| s.status == SectionStatus::Complete)
        .count();
    let mut line = format!(
        "[{phase}] sections {done}/{total} | {words} words, ~{minutes} min read",
        total = view.sections.len(),
        words = view.stats.words,
        minutes = view.stats.reading_minutes,
    );
    if let Some(alert) = &view.alert {
        line.push_str(" | ! ");
        line.push_str(alert);
    }
    line
}

#[cfg(test)]
mod tests {
    use hyperknow_core::{update, DocumentState, Msg};

    use super::{html_for, status_line};

    fn article_view(markdown: &str, is_complete: bool) -> hyperknow_core::DocumentViewModel {
        let (state, _) = update(
            DocumentState::new(),
            Msg::ResumeConversation {
                conversation_id: "abc123".to_string(),
            },
        );
        let (state, _) = update(
            state,
            Msg::ContentPollArrived {
                markdown: markdown.to_string(),
                is_complete,
            },
        );
        state.view()
    }

    #[test]
    fn markdown_renders_to_html() {
        let view = article_view("# Intro\n\nSome *emphasis*.", false);
        let html = html_for(&view);
        assert!(html.contains("<h1>Intro</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn placeholder_tracks_completion() {
        let incomplete = html_for(&article_view("# Intro", false));
        assert!(incomplete.contains("class=\"generating\""));

        let complete = html_for(&article_view("# Intro", true));
        assert!(!complete.contains("class=\"generating\""));
    }

    #[test]
    fn extras_are_embedded_after_completion() {
        let (state, _) = update(
            DocumentState::new(),
            Msg::ResumeConversation {
                conversation_id: "abc123".to_string(),
            },
        );
        let (state, _) = update(
            state,
            Msg::ContentPollArrived {
                markdown: "done".to_string(),
                is_complete: true,
            },
        );
        let (state, _) = update(
            state,
            Msg::ExtrasArrived {
                mermaid_source: "graph TD\nA-->B".to_string(),
                related_topics: vec!["Perceptrons".to_string()],
            },
        );
        let html = html_for(&state.view());
        assert!(html.contains("<pre class=\"mermaid\">"));
        assert!(html.contains("<li>Perceptrons</li>"));
    }

    #[test]
    fn status_line_reports_phase_and_stats() {
        let view = article_view("one two three", false);
        let line = status_line(&view);
        assert!(line.contains("[streaming article]"));
        assert!(line.contains("3 words"));
    }
}
