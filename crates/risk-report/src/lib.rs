use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod citations;
pub mod error;
pub mod fence;
pub mod markdown;
pub mod pipeline;
pub mod report;
pub mod severity;

pub use citations::{apply_citations, unresolved_markers, Citation, CitationOptions};
pub use error::ReportError;
pub use fence::strip_code_fence;
pub use markdown::{Align, Block, MarkdownDocument};
pub use pipeline::format_response;
pub use report::{parse_risks, render_report, render_risks, NO_REFERENCE_HTML};
pub use severity::{map_severity, Severity};

/// Keys every element of `risks` must carry, in report order.
pub const RISK_FIELDS: [&str; 9] = [
    "title",
    "severity",
    "description",
    "file",
    "startingLine",
    "citation",
    "recommendation",
    "existingCode",
    "updatedCode",
];

/// One finding of a code review report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub title: String,
    pub severity: String,
    pub description: String,
    pub file: String,
    pub starting_line: LineNumber,
    /// Required key, but `null` is allowed.
    #[serde(deserialize_with = "required_nullable")]
    pub citation: Option<String>,
    pub recommendation: String,
    pub existing_code: String,
    pub updated_code: String,
}

impl Risk {
    /// Citation HTML for the reference row, or the fixed fallback block.
    pub fn reference(&self) -> &str {
        match self.citation.as_deref() {
            Some(citation) if !citation.is_empty() => citation,
            _ => NO_REFERENCE_HTML,
        }
    }
}

/// `startingLine` as the model emitted it: a JSON number or free text such as `"12-14"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LineNumber {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineNumber::Number(number) => write!(f, "{number}"),
            LineNumber::Text(text) => f.write_str(text),
        }
    }
}

// With a custom deserializer serde no longer treats an absent Option as None,
// so a missing key is still reported as `missing field`.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
