use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "viracity",
    version,
    about = "Prompt-driven code risk review with cited Markdown reports"
)]
pub(crate) struct Args {
    #[arg(long, global = true, default_value = "config/viracity.toml")]
    pub(crate) config: PathBuf,
    #[arg(long, global = true)]
    pub(crate) log_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Fill a prompt template, send it to the model and print the report.
    Run(RunArgs),
    /// Format a saved model response without calling the model.
    Render(RenderArgs),
    /// List prompt templates with their placeholders.
    Prompts,
}

#[derive(ClapArgs, Debug)]
pub(crate) struct RunArgs {
    #[arg(long)]
    pub(crate) prompt: String,
    /// Placeholder value as `name=text` or `name=@file`.
    #[arg(long = "var", value_parser = parse_var)]
    pub(crate) vars: Vec<PromptVar>,
    #[arg(long)]
    pub(crate) dump_response: Option<PathBuf>,
    #[arg(long)]
    pub(crate) dump_citations: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
pub(crate) struct RenderArgs {
    #[arg(long)]
    pub(crate) response: PathBuf,
    /// JSON array of citations returned alongside the response.
    #[arg(long)]
    pub(crate) citations: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
pub(crate) struct OutputArgs {
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub(crate) no_citation_content: bool,
    #[arg(long, default_value_t = false)]
    pub(crate) html_styles: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VarSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PromptVar {
    pub(crate) name: String,
    pub(crate) source: VarSource,
}

impl PromptVar {
    fn resolve(&self) -> anyhow::Result<String> {
        match &self.source {
            VarSource::Inline(value) => Ok(value.clone()),
            VarSource::File(path) => std::fs::read_to_string(path).with_context(|| {
                format!("failed to read value of {} from {}", self.name, path.display())
            }),
        }
    }
}

fn parse_var(raw: &str) -> Result<PromptVar, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value or name=@file, got {raw}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("placeholder name is empty".to_string());
    }
    let source = match value.strip_prefix('@') {
        Some(path) => VarSource::File(PathBuf::from(path)),
        None => VarSource::Inline(value.to_string()),
    };
    Ok(PromptVar {
        name: name.to_string(),
        source,
    })
}

/// Later `--var` flags override earlier ones with the same name.
pub(crate) fn resolve_vars(vars: &[PromptVar]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for var in vars {
        values.insert(var.name.clone(), var.resolve()?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_subcommand() {
        let args = Args::try_parse_from([
            "viracity",
            "--config",
            "custom.toml",
            "run",
            "--prompt",
            "pr-risk-review.xml",
            "--var",
            "diff=@changes.diff",
            "--var",
            "note=a=b",
            "--html-styles",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("custom.toml"));
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.prompt, "pr-risk-review.xml");
        assert_eq!(
            run.vars,
            vec![
                PromptVar {
                    name: "diff".to_string(),
                    source: VarSource::File(PathBuf::from("changes.diff")),
                },
                PromptVar {
                    name: "note".to_string(),
                    source: VarSource::Inline("a=b".to_string()),
                },
            ]
        );
        assert!(run.output.html_styles);
        assert!(!run.output.no_citation_content);
    }

    #[test]
    fn parses_render_subcommand_with_global_flags_after() {
        let args = Args::try_parse_from([
            "viracity",
            "render",
            "--response",
            "response.txt",
            "--no-citation-content",
            "--log-to-stderr",
        ])
        .unwrap();
        assert!(args.log_to_stderr);
        assert_eq!(args.config, PathBuf::from("config/viracity.toml"));
        let Command::Render(render) = args.command else {
            panic!("expected render");
        };
        assert_eq!(render.response, PathBuf::from("response.txt"));
        assert!(render.citations.is_none());
        assert!(render.output.no_citation_content);
    }

    #[test]
    fn rejects_var_without_equals() {
        assert!(parse_var("diff").is_err());
        assert!(parse_var("=value").is_err());
    }

    #[test]
    fn resolves_file_and_inline_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.diff");
        std::fs::write(&path, "+Disabled=false\n").unwrap();
        let vars = vec![
            PromptVar {
                name: "diff".to_string(),
                source: VarSource::File(path),
            },
            PromptVar {
                name: "note".to_string(),
                source: VarSource::Inline("first".to_string()),
            },
            PromptVar {
                name: "note".to_string(),
                source: VarSource::Inline("second".to_string()),
            },
        ];
        let values = resolve_vars(&vars).unwrap();
        assert_eq!(values["diff"], "+Disabled=false\n");
        assert_eq!(values["note"], "second");
    }

    #[test]
    fn missing_value_file_is_an_error() {
        let vars = vec![PromptVar {
            name: "diff".to_string(),
            source: VarSource::File(PathBuf::from("/nonexistent/viracity/changes.diff")),
        }];
        assert!(resolve_vars(&vars).is_err());
    }
}
