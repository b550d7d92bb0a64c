//! Translated content validation.
//!
//! Model output is written straight into the documentation tree, so it is
//! checked before it lands: active HTML is refused outright, and structural
//! elements that should survive translation (URLs, links, code fences,
//! frontmatter) are compared against the English source.

use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make the translation unusable
    pub errors: Vec<String>,

    /// Suspicious differences worth a log line
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContentValidator;

static SCRIPT_REGEX: OnceLock<Regex> = OnceLock::new();
static EVENT_HANDLER_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static MARKDOWN_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

impl ContentValidator {
    /// Compare a translation against its English source.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if translated.trim().is_empty() {
            report.errors.push("Translation is empty".to_string());
            return report;
        }

        // Only flag active content the model introduced
        if Self::has_script(translated) && !Self::has_script(original) {
            report.errors.push("Translation contains a <script> tag".to_string());
        }
        if Self::has_event_handler(translated) && !Self::has_event_handler(original) {
            report
                .errors
                .push("Translation contains an inline event handler".to_string());
        }

        let orig_urls = Self::extract_urls(original);
        let trans_urls = Self::extract_urls(translated);
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        let orig_links = Self::extract_markdown_links(original);
        let trans_links = Self::extract_markdown_links(translated);
        if orig_links.len() != trans_links.len() {
            report.warnings.push(format!(
                "Markdown link count mismatch: original has {}, translation has {}",
                orig_links.len(),
                trans_links.len()
            ));
        }

        let orig_fences = Self::count_code_fences(original);
        let trans_fences = Self::count_code_fences(translated);
        if orig_fences != trans_fences {
            report.warnings.push(format!(
                "Code fence mismatch: original has {}, translation has {}",
                orig_fences, trans_fences
            ));
        }

        if Self::has_frontmatter(original) && !Self::has_frontmatter(translated) {
            report.warnings.push("Frontmatter block was lost".to_string());
        }

        report
    }

    fn has_script(text: &str) -> bool {
        SCRIPT_REGEX
            .get_or_init(|| Regex::new(r"(?i)<\s*script\b").unwrap())
            .is_match(text)
    }

    fn has_event_handler(text: &str) -> bool {
        EVENT_HANDLER_REGEX
            .get_or_init(|| Regex::new(r#"(?i)\bon[a-z]+\s*=\s*["'{]"#).unwrap())
            .is_match(text)
    }

    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]>]+").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn extract_markdown_links(text: &str) -> Vec<String> {
        let regex =
            MARKDOWN_LINK_REGEX.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn count_code_fences(text: &str) -> usize {
        text.lines()
            .filter(|line| line.trim_start().starts_with("```"))
            .count()
    }

    fn has_frontmatter(text: &str) -> bool {
        let mut lines = text.trim_start().lines();
        lines.next().map(str::trim_end) == Some("---") && lines.any(|l| l.trim_end() == "---")
    }
}
