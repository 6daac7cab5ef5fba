use serde_json::Value;

use crate::error::ReportError;
use crate::markdown::{Align, MarkdownDocument};
use crate::severity::map_severity;
use crate::{Risk, RISK_FIELDS};

pub const NO_REFERENCE_HTML: &str = "<div><details><summary>**None**</summary><br/>Risk detected based on trained knowledge. No citation available.</details></div>";

const RECOMMENDATION_LABEL: &str = "**💡 Recommendation**";
const EXISTING_CODE_LABEL: &str = "**❌ Existing Code**";
const UPDATED_CODE_LABEL: &str = "**✔️ Recommended Update**";
const RISK_SEPARATOR: &str = "<br/>";

/// Parses `{"risks": [...]}` into typed records.
///
/// Every risk is checked for all required keys before it is deserialized, so
/// the error names the offending risk and field instead of failing later.
pub fn parse_risks(input: &str) -> Result<Vec<Risk>, ReportError> {
    let value: Value = serde_json::from_str(input)?;
    let Value::Object(mut root) = value else {
        return Err(ReportError::NotAnObject);
    };
    let Value::Array(items) = root.remove("risks").ok_or(ReportError::MissingRisks)? else {
        return Err(ReportError::RisksNotArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_risk(index, item))
        .collect()
}

fn parse_risk(index: usize, item: Value) -> Result<Risk, ReportError> {
    let Some(fields) = item.as_object() else {
        return Err(ReportError::RiskNotObject { index });
    };
    if let Some(field) = RISK_FIELDS
        .iter()
        .copied()
        .find(|field| !fields.contains_key(*field))
    {
        return Err(ReportError::MissingField { index, field });
    }
    serde_json::from_value(item).map_err(|source| ReportError::InvalidRisk { index, source })
}

pub fn render_report(input: &str) -> Result<MarkdownDocument, ReportError> {
    let risks = parse_risks(input)?;
    tracing::debug!(risks = risks.len(), "rendering risk report");
    Ok(render_risks(&risks))
}

pub fn render_risks(risks: &[Risk]) -> MarkdownDocument {
    let mut doc = MarkdownDocument::new();
    for risk in risks {
        append_risk(&mut doc, risk);
    }
    doc
}

fn append_risk(doc: &mut MarkdownDocument, risk: &Risk) {
    doc.add_heading(risk.title.as_str(), 1);
    doc.add_table(
        vec!["**Severity**".to_string(), map_severity(&risk.severity)],
        vec![
            row("**Description**", &risk.description),
            row("**File**", &risk.file),
            row("**Line**", &risk.starting_line.to_string()),
            row("**Reference**", risk.reference()),
        ],
        vec![Align::Left, Align::Left],
    );
    doc.add_paragraph(RECOMMENDATION_LABEL)
        .add_code(risk.recommendation.as_str())
        .add_paragraph(EXISTING_CODE_LABEL)
        .add_code(risk.existing_code.as_str())
        .add_paragraph(UPDATED_CODE_LABEL)
        .add_code(risk.updated_code.as_str())
        .add_paragraph(RISK_SEPARATOR);
}

fn row(label: &str, value: &str) -> Vec<String> {
    vec![label.to_string(), value.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::Block;

    const OPEN_PORT: &str = r#"{"risks":[{"title":"Open Port","severity":"high","description":"d","file":"f.ini","startingLine":3,"citation":null,"recommendation":"r","existingCode":"a=1","updatedCode":"a=0"}]}"#;

    fn risk(title: &str, severity: &str) -> String {
        format!(
            r#"{{"title":"{title}","severity":"{severity}","description":"desc","file":"src/app.ini","startingLine":"10","citation":"<details>cite</details>","recommendation":"rec","existingCode":"old","updatedCode":"new"}}"#
        )
    }

    #[test]
    fn renders_open_port_report() {
        let doc = render_report(OPEN_PORT).expect("render");
        let text = doc.render();
        assert!(text.starts_with("# Open Port\n"));
        assert!(text.contains("| **Severity** | High ⚠️⚠️⚠️ |"));
        assert!(text.contains("| **File** | f.ini |"));
        assert!(text.contains("| **Line** | 3 |"));
        assert!(text.contains(&format!("| **Reference** | {NO_REFERENCE_HTML} |")));
        assert!(text.contains("```\nr\n```"));
        assert!(text.contains("```\na=1\n```"));
        assert!(text.contains("```\na=0\n```"));

        let code: Vec<&Block> = doc
            .blocks()
            .iter()
            .filter(|block| matches!(block, Block::Code(_)))
            .collect();
        assert_eq!(
            code,
            vec![
                &Block::Code("r".to_string()),
                &Block::Code("a=1".to_string()),
                &Block::Code("a=0".to_string()),
            ]
        );
    }

    #[test]
    fn renders_one_group_per_risk_in_order() {
        let input = format!(
            r#"{{"risks":[{},{},{}]}}"#,
            risk("First", "low"),
            risk("Second", "critical"),
            risk("Third", "unknown")
        );
        let doc = render_report(&input).expect("render");
        let headings: Vec<&str> = doc
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(headings, vec!["First", "Second", "Third"]);

        let tables = doc
            .blocks()
            .iter()
            .filter(|block| matches!(block, Block::Table { .. }))
            .count();
        let code = doc
            .blocks()
            .iter()
            .filter(|block| matches!(block, Block::Code(_)))
            .count();
        assert_eq!(tables, 3);
        assert_eq!(code, 9);

        let text = doc.render();
        assert!(text.contains("| **Severity** | unknown |"));
        assert!(text.contains("| **Reference** | <details>cite</details> |"));
    }

    #[test]
    fn each_risk_ends_with_separator() {
        let doc = render_report(OPEN_PORT).expect("render");
        assert_eq!(doc.blocks().len(), 9);
        assert_eq!(
            doc.blocks().last(),
            Some(&Block::Paragraph("<br/>".to_string()))
        );
    }

    #[test]
    fn empty_risk_list_renders_empty_document() {
        let doc = render_report(r#"{"risks":[]}"#).expect("render");
        assert!(doc.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = render_report(r#"{"risks":[{"title":"#).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 1, .. }));
    }

    #[test]
    fn missing_risks_key_is_an_error() {
        let err = render_report(r#"{"findings":[]}"#).unwrap_err();
        assert!(matches!(err, ReportError::MissingRisks));
    }

    #[test]
    fn non_array_risks_is_an_error() {
        let err = render_report(r#"{"risks":{}}"#).unwrap_err();
        assert!(matches!(err, ReportError::RisksNotArray));
    }

    #[test]
    fn non_object_root_is_an_error() {
        let err = render_report("[]").unwrap_err();
        assert!(matches!(err, ReportError::NotAnObject));
    }

    #[test]
    fn non_object_risk_names_its_index() {
        let err = render_report(r#"{"risks":[1]}"#).unwrap_err();
        assert!(matches!(err, ReportError::RiskNotObject { index: 0 }));
    }

    #[test]
    fn missing_field_names_risk_and_field() {
        let broken = r#"{"title":"t","severity":"low","description":"d","file":"f","startingLine":1,"citation":null,"recommendation":"r","existingCode":"a"}"#;
        let input = format!(r#"{{"risks":[{},{broken}]}}"#, risk("ok", "low"));
        let err = render_report(&input).unwrap_err();
        match err {
            ReportError::MissingField { index, field } => {
                assert_eq!(index, 1);
                assert_eq!(field, "updatedCode");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_field_type_is_an_error() {
        let input = r#"{"risks":[{"title":1,"severity":"low","description":"d","file":"f","startingLine":1,"citation":null,"recommendation":"r","existingCode":"a","updatedCode":"b"}]}"#;
        let err = render_report(input).unwrap_err();
        assert!(matches!(err, ReportError::InvalidRisk { index: 0, .. }));
    }

    #[test]
    fn code_content_is_preserved_verbatim() {
        let input = r##"{"risks":[{"title":"t","severity":"low","description":"d","file":"f","startingLine":1,"citation":null,"recommendation":"Use `x` | *y*","existingCode":"[Firewall]\nPort=TCP/80:APFW\\Internet","updatedCode":"# removed"}]}"##;
        let text = render_report(input).expect("render").render();
        assert!(text.contains("```\nUse `x` | *y*\n```"));
        assert!(text.contains("```\n[Firewall]\nPort=TCP/80:APFW\\Internet\n```"));
        assert!(text.contains("```\n# removed\n```"));
    }
}
