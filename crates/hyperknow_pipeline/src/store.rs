use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("archive directory missing or not writable: {0}")]
    ArchiveDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("saved article {0} is missing frontmatter fields")]
    MissingFrontmatter(String),
}

/// Frontmatter fields written alongside a saved article.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleMeta {
    pub topic: String,
    pub conversation_id: String,
    pub generated_utc: String,
    pub word_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArticle {
    pub path: PathBuf,
    pub filename: String,
}

/// Local archive of completed articles, one markdown file per conversation.
///
/// Writes are atomic: temp file in the target directory, then rename, so a
/// crash never leaves a half-written article behind.
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, meta: &ArticleMeta, markdown: &str) -> Result<StoredArticle, StoreError> {
        self.ensure_dir()?;
        let filename = article_filename(&meta.topic, &meta.conversation_id);
        let document = format!(
            "---\ntopic: {topic}\nconversation_id: {conversation}\ngenerated_utc: {generated}\nword_count: {words}\n---\n\n{body}",
            topic = meta.topic,
            conversation = meta.conversation_id,
            generated = meta.generated_utc,
            words = meta.word_count,
            body = markdown,
        );

        let target = self.dir.join(&filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(document.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

        Ok(StoredArticle {
            path: target,
            filename,
        })
    }

    /// Reads a saved article back into its metadata and body.
    pub fn load(&self, filename: &str) -> Result<(ArticleMeta, String), StoreError> {
        let content = fs::read_to_string(self.dir.join(filename))?;
        let mut lines = content.lines();
        if lines.next() != Some("---") {
            return Err(StoreError::MissingFrontmatter(filename.to_string()));
        }
        let mut meta = ArticleMeta::default();
        for line in &mut lines {
            if line.trim() == "---" {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "topic" => meta.topic = value.to_string(),
                    "conversation_id" => meta.conversation_id = value.to_string(),
                    "generated_utc" => meta.generated_utc = value.to_string(),
                    "word_count" => meta.word_count = value.parse().unwrap_or(0),
                    _ => {}
                }
            }
        }
        if meta.conversation_id.is_empty() || meta.generated_utc.is_empty() {
            return Err(StoreError::MissingFrontmatter(filename.to_string()));
        }
        let body: Vec<&str> = lines.collect();
        let mut body = body.join("\n");
        if let Some(stripped) = body.strip_prefix('\n') {
            body = stripped.to_string();
        }
        Ok((meta, body))
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        if self.dir.exists() {
            let metadata =
                fs::metadata(&self.dir).map_err(|e| StoreError::ArchiveDir(e.to_string()))?;
            if !metadata.is_dir() {
                return Err(StoreError::ArchiveDir("path is not a directory".into()));
            }
        } else {
            fs::create_dir_all(&self.dir).map_err(|e| StoreError::ArchiveDir(e.to_string()))?;
        }
        Ok(())
    }
}

/// Windows-safe, deterministic filename:
/// `{sanitized_topic}--{short_hash(conversation_id)}.md`
pub fn article_filename(topic: &str, conversation_id: &str) -> String {
    format!(
        "{}--{}.md",
        sanitize_topic(topic),
        short_hash(conversation_id)
    )
}

fn sanitize_topic(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let mapped = if is_forbidden(c) { '_' } else { c };
        if mapped == '_' {
            if !prev_underscore {
                cleaned.push('_');
            }
            prev_underscore = true;
        } else {
            cleaned.push(mapped);
            prev_underscore = false;
        }
    }
    let mut name = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if name.is_empty() {
        name = "article".to_string();
    }
    if name.len() > 80 {
        let mut end = 80;
        while end > 0 && !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
