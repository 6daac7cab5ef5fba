use prompt_library::{fill_placeholders, PromptLibrary};
use risk_report::{format_response, unresolved_markers, CitationOptions, MarkdownDocument};
use std::collections::BTreeMap;

use crate::chat::{ChatClient, ChatCompletion, ChatRequest, DataSource};
use crate::config::ViracityConfig;

/// Style block the notebook renderer needed to top-align long table cells.
pub(crate) const TABLE_CELL_STYLES: &str = "<style>\n    /* Vertically align all table content to the top */\n    .markdown table td {\n        vertical-align: top;\n    }\n</style>\n";

pub(crate) struct ReviewOutcome {
    pub(crate) report: MarkdownDocument,
    pub(crate) completion: ChatCompletion,
    pub(crate) unresolved: Vec<usize>,
}

pub(crate) fn build_prompt(
    library: &PromptLibrary,
    template_name: &str,
    values: &BTreeMap<String, String>,
) -> anyhow::Result<String> {
    let template = library.get(template_name)?;
    Ok(fill_placeholders(template, values)?)
}

pub(crate) fn build_user_prompt(system_prompt: Option<&str>, filled_prompt: &str) -> String {
    match system_prompt.map(str::trim).filter(|prompt| !prompt.is_empty()) {
        Some(system) => format!("{system}\n{filled_prompt}"),
        None => filled_prompt.to_string(),
    }
}

pub(crate) fn build_chat_request(config: &ViracityConfig, filled_prompt: &str) -> ChatRequest {
    let system_prompt = config.system_prompt.as_deref();
    let request = ChatRequest::new(
        config.service.model.as_str(),
        build_user_prompt(system_prompt, filled_prompt),
        &config.request,
    );
    match &config.search {
        Some(search) => request.with_data_source(DataSource::azure_search(search, system_prompt)),
        None => request,
    }
}

pub(crate) fn format_completion(
    completion: ChatCompletion,
    options: &CitationOptions,
) -> anyhow::Result<ReviewOutcome> {
    let unresolved = unresolved_markers(&completion.content, completion.citations.len());
    let report = format_response(&completion.content, &completion.citations, options)?;
    Ok(ReviewOutcome {
        report,
        completion,
        unresolved,
    })
}

pub(crate) async fn run_review(
    client: &ChatClient,
    config: &ViracityConfig,
    filled_prompt: &str,
    options: &CitationOptions,
) -> anyhow::Result<ReviewOutcome> {
    let request = build_chat_request(config, filled_prompt);
    let completion = client.complete(&request).await?;
    tracing::debug!(model = %client.model(), response = %completion.content, "raw model response");
    tracing::info!(citations = completion.citations.len(), "formatting review");
    format_completion(completion, options)
}

pub(crate) fn decorate_output(report: &MarkdownDocument, html_styles: bool) -> String {
    if html_styles {
        format!("{TABLE_CELL_STYLES}<br/><br/>\n\n\n{report}")
    } else {
        report.render()
    }
}
