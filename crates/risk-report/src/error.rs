use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid risk report json: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("risk report must be a json object")]
    NotAnObject,
    #[error("risk report is missing the `risks` field")]
    MissingRisks,
    #[error("`risks` must be an array")]
    RisksNotArray,
    #[error("risks[{index}] must be a json object")]
    RiskNotObject { index: usize },
    #[error("risks[{index}] is missing field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("risks[{index}] is invalid: {source}")]
    InvalidRisk {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
