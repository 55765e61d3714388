const WORDS_PER_MINUTE: usize = 200;
const CHARS_PER_PAGE: usize = 3000;

/// Reading statistics for the status bar, recomputed per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArticleStats {
    pub words: usize,
    pub chars: usize,
    pub reading_minutes: usize,
    pub estimated_pages: usize,
}

pub fn article_stats(markdown: &str) -> ArticleStats {
    let words = markdown.split_whitespace().count();
    let chars = markdown.chars().count();
    ArticleStats {
        words,
        chars,
        reading_minutes: words.div_ceil(WORDS_PER_MINUTE),
        estimated_pages: chars.div_ceil(CHARS_PER_PAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::article_stats;

    #[test]
    fn empty_content_has_zero_stats() {
        let stats = article_stats("");
        assert_eq!(stats.words, 0);
        assert_eq!(stats.chars, 0);
        assert_eq!(stats.reading_minutes, 0);
        assert_eq!(stats.estimated_pages, 0);
    }

    #[test]
    fn reading_time_rounds_up() {
        let text = vec!["word"; 201].join(" ");
        let stats = article_stats(&text);
        assert_eq!(stats.words, 201);
        assert_eq!(stats.reading_minutes, 2);
    }

    #[test]
    fn page_estimate_counts_characters() {
        let text = "x".repeat(3001);
        assert_eq!(article_stats(&text).estimated_pages, 2);
    }
}
