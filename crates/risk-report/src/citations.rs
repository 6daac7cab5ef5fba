//! Rewrites `[docN]` markers in a model response into collapsible citation blocks.
//!
//! The response is still JSON at this point, so every fragment inserted here
//! must be safe inside a JSON string literal: no double quotes, doubled
//! backslashes, escaped line breaks and no other control characters.

use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::null_as_empty;

const LINK_GLYPH: &str = "🔗";
const NO_CONTENT: &str = "No citation content available.";

/// Literal rewrites for recurring artifacts in indexed documents.
pub const KNOWN_ARTIFACT_FIXES: &[(&str, &str)] = &[(
    "SE_DENY_REMOTE_INTERACTIVE_LOGON_NAME,SE_BATCH_LOGON_NAME,SE_DENY_NETWORK_LOGON_NAME,SE_INTERACTIVE_LOGON_NAME",
    "SE_DENY_REMOTE_INTERACTIVE_LOGON_NAME, SE_BATCH_LOGON_NAME, SE_DENY_NETWORK_LOGON_NAME, SE_INTERACTIVE_LOGON_NAME",
)];

static MARKER: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub filepath: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chunk_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationOptions {
    /// Embed the snippet body; otherwise a fixed placeholder is shown.
    pub show_content: bool,
}

impl Default for CitationOptions {
    fn default() -> Self {
        Self { show_content: true }
    }
}

fn marker_regex() -> &'static Regex {
    MARKER.get_or_init(|| Regex::new(r"\[doc(\d+)\]").expect("citation marker pattern"))
}

/// Replaces every in-range `[docN]` with the detail block of `citations[N - 1]`.
///
/// Markers are resolved in a single pass, so text inserted for one citation is
/// never scanned for further markers. Out-of-range markers stay as written.
pub fn apply_citations(text: &str, citations: &[Citation], options: &CitationOptions) -> String {
    if citations.is_empty() {
        return text.to_string();
    }
    let unresolved = unresolved_markers(text, citations.len());
    if !unresolved.is_empty() {
        tracing::warn!(
            markers = ?unresolved,
            citations = citations.len(),
            "citation markers without a matching citation"
        );
    }
    let details: Vec<String> = citations
        .iter()
        .map(|citation| citation_detail(citation, options))
        .collect();
    marker_regex()
        .replace_all(text, |caps: &Captures| match marker_position(caps, details.len()) {
            Some(position) => details[position].clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Marker numbers in `text` that do not address one of `count` citations.
pub fn unresolved_markers(text: &str, count: usize) -> Vec<usize> {
    marker_regex()
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|number| *number == 0 || *number > count)
        .collect()
}

fn marker_position(caps: &Captures, count: usize) -> Option<usize> {
    let number = caps[1].parse::<usize>().ok()?;
    (1..=count).contains(&number).then(|| number - 1)
}

pub fn citation_detail(citation: &Citation, options: &CitationOptions) -> String {
    let content = if options.show_content {
        sanitize_snippet(&render_snippet(citation))
    } else {
        NO_CONTENT.to_string()
    };
    format!(
        "<details><summary>{} - [View File]({})</summary><br/><div style='padding: 20px 30px 30px 30px;'>{}</div></details>",
        embed_safe(&citation.title),
        embed_safe(&citation.url),
        content
    )
}

/// Marks the citation title inside its content and renders the Markdown snippet to HTML.
fn render_snippet(citation: &Citation) -> String {
    let decorated = if citation.title.is_empty() {
        citation.content.clone()
    } else {
        citation
            .content
            .replace(&citation.title, &format!("{LINK_GLYPH} {}", citation.title))
    };
    let mut rendered = String::with_capacity(decorated.len() + decorated.len() / 2);
    html::push_html(&mut rendered, Parser::new_ext(&decorated, Options::ENABLE_TABLES));
    rendered
}

/// Snippet clean-up; the order of the steps matters.
pub fn sanitize_snippet(snippet: &str) -> String {
    let mut text = snippet
        .replace('"', "'")
        .replace("\\u200b", "")
        .replace('\u{200b}', "")
        .replace('\\', "\\\\");
    for (artifact, fixed) in KNOWN_ARTIFACT_FIXES {
        text = text.replace(artifact, fixed);
    }
    escape_control_chars(&text)
}

/// Title and url treatment: quotes, backslashes and control characters.
fn embed_safe(text: &str) -> String {
    escape_control_chars(&text.replace('"', "'").replace('\\', "\\\\"))
}

// Line feeds and tabs become JSON escapes; other C0 characters are dropped.
fn escape_control_chars(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\u{0}'..='\u{1f}' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}
