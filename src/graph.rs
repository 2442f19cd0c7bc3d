//! Client for the agent-graph server that does the actual PR work.
//!
//! Each job gets a fresh thread and a blocking run; we only read back the
//! last message's token usage for logging.

use async_trait::async_trait;
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, info_span, warn, Instrument};

use crate::{
    error::GraphError,
    jobs::{DispatchJob, JobRunner},
};

#[derive(Args, Debug, Clone)]
pub struct GraphConfig {
    /// Base URL of the agent-graph server.
    #[arg(long = "graph-url", env = "GRAPH_API_URL", default_value = "http://localhost:2024")]
    pub url: String,

    /// Graph (assistant) to run for every job.
    #[arg(long = "assistant", env = "GRAPH_ASSISTANT_ID", default_value = "simple_agent")]
    pub assistant_id: String,

    /// Model identifier forwarded in the run context.
    #[arg(long, env = "GRAPH_MODEL", default_value = "xai:grok-4-fast-reasoning")]
    pub model: String,

    /// Maximum number of graph steps per run.
    #[arg(long, env = "GRAPH_RECURSION_LIMIT", default_value_t = 15)]
    pub recursion_limit: u32,
}

#[derive(Debug, Deserialize)]
struct Thread {
    thread_id: String,
}

#[derive(Debug, Serialize)]
struct RunContext<'a> {
    model: &'a str,
    pr_id: u64,
    repo_name: &'a str,
    pr_action: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunState {
    #[serde(default)]
    messages: Vec<RunMessage>,
}

#[derive(Debug, Deserialize)]
struct RunMessage {
    #[serde(default)]
    usage_metadata: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub output_token_details: OutputTokenDetails,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OutputTokenDetails {
    #[serde(default)]
    pub reasoning: u64,
}

#[derive(Debug, Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    config: GraphConfig,
}

impl GraphClient {
    pub fn new(client: reqwest::Client, config: GraphConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    pub async fn create_thread(&self) -> Result<String, GraphError> {
        let response = self.client.post(self.endpoint("threads")).json(&json!({})).send().await?;
        let thread: Thread = check(response).await?.json().await?;
        Ok(thread.thread_id)
    }

    /// Runs the configured graph for `job` on a new thread and waits for the
    /// final state. Returns the token usage of the last message, if reported.
    pub async fn invoke(&self, job: &DispatchJob) -> Result<Option<TokenUsage>, GraphError> {
        let thread_id = self.create_thread().await?;

        let body = json!({
            "assistant_id": self.config.assistant_id,
            "input": {
                "messages": [{"role": "human", "content": job.instruction}],
            },
            "config": {"recursion_limit": self.config.recursion_limit},
            "context": RunContext {
                model: &self.config.model,
                pr_id: job.number,
                repo_name: &job.repository,
                pr_action: job.tag.as_str(),
            },
        });

        let response = self
            .client
            .post(self.endpoint(&format!("threads/{thread_id}/runs/wait")))
            .json(&body)
            .send()
            .await?;
        let state: RunState = check(response).await?.json().await?;

        let last = state.messages.last().ok_or(GraphError::EmptyRun)?;
        Ok(last.usage_metadata)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, GraphError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GraphError::Status { status: status.as_u16(), body })
}

#[async_trait]
impl JobRunner for GraphClient {
    async fn run(&self, job: &DispatchJob) -> Result<(), GraphError> {
        let span = info_span!(
            "graph_run",
            repo = %job.repository,
            number = job.number,
            tag = %job.tag
        );

        async move {
            match self.invoke(job).await? {
                Some(usage) => info!(
                    total = usage.total_tokens,
                    input = usage.input_tokens,
                    reasoning = usage.output_token_details.reasoning,
                    output = usage.output_tokens,
                    "graph run finished"
                ),
                None => warn!("graph run finished without usage metadata"),
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}
