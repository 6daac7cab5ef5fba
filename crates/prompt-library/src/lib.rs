//! Prompt templates with `{{name}}` placeholders.
//!
//! A [`PromptLibrary`] is loaded once from a directory and passed to whoever
//! needs it; there is no process-wide cache.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const TEMPLATE_EXTENSIONS: [&str; 4] = ["xml", "md", "txt", "prompt"];

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read prompt directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read prompt template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown prompt template: {0}")]
    UnknownTemplate(String),
    #[error("placeholder `{0}` has no value")]
    MissingValue(String),
}

#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    templates: BTreeMap<String, String>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every template file directly inside `dir`, keyed by file name.
    pub fn load(dir: &Path) -> Result<Self, PromptError> {
        let entries = std::fs::read_dir(dir).map_err(|source| PromptError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut library = Self::new();
        for entry in entries {
            let entry = entry.map_err(|source| PromptError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() || !is_template(&path) {
                tracing::debug!(path = %path.display(), "skipping non-template file");
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path).map_err(|source| {
                PromptError::ReadTemplate {
                    path: path.clone(),
                    source,
                }
            })?;
            library.insert(name, text);
        }
        tracing::info!(dir = %dir.display(), templates = library.len(), "prompt library loaded");
        Ok(library)
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Result<&str, PromptError> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PromptError::UnknownTemplate(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEMPLATE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([^{}]*?)\}\}").expect("placeholder pattern"))
}

/// Distinct placeholder names in first-appearance order.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let name = caps[1].trim();
        if !name.is_empty() && !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitutes every placeholder; each one the template names needs a non-blank value.
pub fn fill_placeholders(
    template: &str,
    values: &BTreeMap<String, String>,
) -> Result<String, PromptError> {
    for name in extract_placeholders(template) {
        match values.get(&name) {
            Some(value) if !value.trim().is_empty() => {}
            _ => return Err(PromptError::MissingValue(name)),
        }
    }
    let filled = placeholder_regex().replace_all(template, |caps: &Captures| {
        let name = caps[1].trim();
        match values.get(name) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    });
    Ok(filled.into_owned())
}
