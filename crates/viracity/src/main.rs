mod chat;
mod cli;
mod config;
mod http_utils;
mod logging;
mod review;

use crate::chat::{ChatClient, ChatCompletion};
use crate::cli::{resolve_vars, Args, Command, OutputArgs, RenderArgs, RunArgs};
use crate::config::load_viracity_config;
use crate::logging::init_tracing;
use crate::review::{build_prompt, decorate_output, format_completion, run_review, ReviewOutcome};
use anyhow::Context;
use clap::Parser;
use prompt_library::{extract_placeholders, PromptLibrary};
use risk_report::{Citation, CitationOptions};
use std::path::Path;
use tracing::Instrument;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.log_to_stderr)?;

    match args.command {
        Command::Run(run) => run_command(&args.config, run).await,
        Command::Render(render) => render_command(render),
        Command::Prompts => prompts_command(&args.config),
    }
}

async fn run_command(config_path: &Path, run: RunArgs) -> anyhow::Result<()> {
    let config = load_viracity_config(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let library = PromptLibrary::load(&config.prompt_dir)?;
    let values = resolve_vars(&run.vars)?;
    let filled_prompt = build_prompt(&library, &run.prompt, &values)?;
    let api_key = config.service.api_key()?;
    let client = ChatClient::new(config.service.clone(), api_key)?;
    let options = citation_options(&run.output);

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("review", run_id = %run_id, prompt = %run.prompt);
    tracing::info!(
        parent: &span,
        endpoint = %client.endpoint()?,
        placeholders = values.len(),
        retrieval = config.search.is_some(),
        "review starting"
    );
    let outcome = run_review(&client, &config, &filled_prompt, &options)
        .instrument(span.clone())
        .await?;

    if let Some(path) = &run.dump_response {
        std::fs::write(path, &outcome.completion.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &run.dump_citations {
        let citations = serde_json::to_string_pretty(&outcome.completion.citations)?;
        std::fs::write(path, citations)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    span.in_scope(|| finish(&outcome, &run.output))
}

fn render_command(render: RenderArgs) -> anyhow::Result<()> {
    let response = std::fs::read_to_string(&render.response)
        .with_context(|| format!("failed to read response {}", render.response.display()))?;
    let citations = match &render.citations {
        Some(path) => load_citations(path)?,
        None => Vec::new(),
    };
    let completion = ChatCompletion {
        content: response,
        citations,
    };
    let outcome = format_completion(completion, &citation_options(&render.output))
        .with_context(|| format!("failed to format {}", render.response.display()))?;
    finish(&outcome, &render.output)
}

fn prompts_command(config_path: &Path) -> anyhow::Result<()> {
    let config = load_viracity_config(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let library = PromptLibrary::load(&config.prompt_dir)?;
    for name in library.names() {
        let placeholders = extract_placeholders(library.get(name)?);
        if placeholders.is_empty() {
            println!("{name}");
        } else {
            println!("{name}: {}", placeholders.join(", "));
        }
    }
    Ok(())
}

fn load_citations(path: &Path) -> anyhow::Result<Vec<Citation>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read citations {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse citations {}", path.display()))
}

fn citation_options(output: &OutputArgs) -> CitationOptions {
    CitationOptions {
        show_content: !output.no_citation_content,
    }
}

fn finish(outcome: &ReviewOutcome, output: &OutputArgs) -> anyhow::Result<()> {
    let text = decorate_output(&outcome.report, output.html_styles);
    match &output.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                bytes = text.len(),
                unresolved = outcome.unresolved.len(),
                "report written"
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}
