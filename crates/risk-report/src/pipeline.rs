use crate::citations::{apply_citations, Citation, CitationOptions};
use crate::error::ReportError;
use crate::fence::strip_code_fence;
use crate::markdown::MarkdownDocument;
use crate::report::render_report;

/// Turns a raw model response plus its citations into the final report.
pub fn format_response(
    response_text: &str,
    citations: &[Citation],
    options: &CitationOptions,
) -> Result<MarkdownDocument, ReportError> {
    let annotated = apply_citations(response_text, citations, options);
    render_report(strip_code_fence(&annotated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_fenced_response_with_citations() {
        let response = "```json\n{\"risks\":[{\"title\":\"Inbound Internet rule\",\"severity\":\"Critical\",\"description\":\"Port open to Internet\",\"file\":\"ServiceConfig.ini\",\"startingLine\":12,\"citation\":\"[doc1]\",\"recommendation\":\"Use tags\",\"existingCode\":\"MessageBus=TCP/12000:APFW\\\\Internet\",\"updatedCode\":\"\"}]}\n```";
        let citations = vec![Citation {
            url: "https://docs.example/inbound".to_string(),
            filepath: "inbound.md".to_string(),
            chunk_id: "1".to_string(),
            title: "Eliminate Internet inbound".to_string(),
            content: "Eliminate Internet inbound rules.".to_string(),
        }];
        let text = format_response(response, &citations, &CitationOptions::default())
            .expect("report")
            .render();
        assert!(text.starts_with("# Inbound Internet rule\n"));
        assert!(text.contains("| **Severity** | Critical ⚠️⚠️⚠️⚠️ |"));
        assert!(text.contains(
            "| **Reference** | <details><summary>Eliminate Internet inbound - [View File](https://docs.example/inbound)</summary>"
        ));
        assert!(text.contains("```\nMessageBus=TCP/12000:APFW\\Internet\n```"));
    }

    #[test]
    fn propagates_parse_errors() {
        let err = format_response("not json", &[], &CitationOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }
}
