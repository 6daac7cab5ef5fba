use risk_report::Citation;
use serde::Serialize;

use crate::config::{RequestConfig, SearchConfig};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ChatMessage {
    pub(crate) role: String,
    pub(crate) content: String,
}

impl ChatMessage {
    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub(crate) format_type: String,
}

impl ResponseFormat {
    pub(crate) fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Chat-completion body, including the optional retrieval extension.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ChatRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f64,
    pub(crate) top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seed: Option<i64>,
    pub(crate) presence_penalty: f64,
    pub(crate) frequency_penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) data_sources: Vec<DataSource>,
}

impl ChatRequest {
    pub(crate) fn new(model: impl Into<String>, prompt: impl Into<String>, request: &RequestConfig) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            seed: request.seed,
            presence_penalty: request.presence_penalty,
            frequency_penalty: request.frequency_penalty,
            response_format: request.json_response.then(ResponseFormat::json_object),
            data_sources: Vec::new(),
        }
    }

    pub(crate) fn with_data_source(mut self, source: DataSource) -> Self {
        self.data_sources.push(source);
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct DataSource {
    #[serde(rename = "type")]
    pub(crate) source_type: String,
    pub(crate) parameters: SearchParameters,
}

impl DataSource {
    pub(crate) fn azure_search(search: &SearchConfig, role_information: Option<&str>) -> Self {
        Self {
            source_type: "azure_search".to_string(),
            parameters: SearchParameters {
                endpoint: search.endpoint.clone(),
                index_name: search.index_name.clone(),
                in_scope: search.in_scope,
                strictness: search.strictness,
                top_n_documents: search.top_n_documents,
                query_type: search.query_type.clone(),
                embedding_dependency: search.embedding_deployment.as_ref().map(|name| {
                    EmbeddingDependency {
                        dependency_type: "deployment_name".to_string(),
                        deployment_name: name.clone(),
                    }
                }),
                semantic_configuration: search.semantic_configuration.clone(),
                allow_partial_result: search.allow_partial_result,
                authentication: SearchAuthentication {
                    auth_type: search.authentication.clone(),
                },
                role_information: role_information.map(str::to_string),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct SearchParameters {
    pub(crate) endpoint: String,
    pub(crate) index_name: String,
    pub(crate) in_scope: bool,
    pub(crate) strictness: u8,
    pub(crate) top_n_documents: u16,
    pub(crate) query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) embedding_dependency: Option<EmbeddingDependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) semantic_configuration: Option<String>,
    pub(crate) allow_partial_result: bool,
    pub(crate) authentication: SearchAuthentication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) role_information: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct EmbeddingDependency {
    #[serde(rename = "type")]
    pub(crate) dependency_type: String,
    pub(crate) deployment_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct SearchAuthentication {
    #[serde(rename = "type")]
    pub(crate) auth_type: String,
}

/// Assistant text plus the retrieval citations attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChatCompletion {
    pub(crate) content: String,
    pub(crate) citations: Vec<Citation>,
}
