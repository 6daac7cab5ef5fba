mod client;
mod types;

pub(crate) use client::ChatClient;
pub(crate) use types::{ChatCompletion, ChatRequest, DataSource};
