use crate::matcher::compile_regex;
use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_GRAMMAR: Lazy<Regex> = Lazy::new(|| compile_regex(r#"^(.+?)\s+on\s+X:\s+"(.+?)""#));

const TRUNCATION_MARKER: &str = "...";

/// Fields recovered from a content page title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub author: String,
    pub title_summary: String,
    pub full_content: String,
}

/// Parses `<author> on X: "<content>"` page titles.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    summary_max_chars: usize,
}

impl MetadataExtractor {
    pub fn new(summary_max_chars: usize) -> Self {
        Self { summary_max_chars }
    }

    /// `None` when the title does not follow the grammar; callers must not
    /// store a partial record in that case.
    pub fn extract(&self, title: &str) -> Option<PageMetadata> {
        let caps = TITLE_GRAMMAR.captures(title)?;
        let author = caps.get(1)?.as_str();
        let content = caps.get(2)?.as_str();
        Some(PageMetadata {
            author: author.to_string(),
            title_summary: truncate_summary(content, self.summary_max_chars),
            full_content: content.to_string(),
        })
    }
}

fn truncate_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}
