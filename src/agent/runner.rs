//! Assistant runner.
//!
//! The assistant runs as a single task owning the LLM provider and the tool
//! registry. HTTP handlers talk to it through an [`AgentHandle`], one
//! question per request, so tool execution and model calls never block the
//! server's worker pool.

use super::llm::{CompletionOptions, FinishReason, LlmError, LlmProvider, Message};
use super::tools::AgentToolRegistry;
use serde_json::json;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SYSTEM_PROMPT: &str = "You are the assistant of a personal media catalog. \
You answer questions about the music singles the user has pinned over time. \
Use the available tools to look up real data before answering; never invent \
catalog contents. When a question involves relative time such as 'last week', \
call get_today first to anchor it. Answer concisely in plain text.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model request failed: {0}")]
    Model(#[from] LlmError),

    #[error("Assistant is not running")]
    Unavailable,

    #[error("No answer after {0} tool rounds")]
    IterationsExhausted(usize),
}

struct AgentRequest {
    question: String,
    reply: oneshot::Sender<Result<String, AgentError>>,
}

/// Cheaply cloneable handle for submitting questions to the assistant task.
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<AgentRequest>,
}

impl AgentHandle {
    pub async fn ask(&self, question: String) -> Result<String, AgentError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(AgentRequest {
                question,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AgentError::Unavailable)?;
        reply_rx.await.map_err(|_| AgentError::Unavailable)?
    }
}

/// The assistant task. Owns the provider and tools; consumed by [`run`].
pub struct CatalogAgent {
    provider: Box<dyn LlmProvider>,
    registry: AgentToolRegistry,
    options: CompletionOptions,
    max_iterations: usize,
}

impl CatalogAgent {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        registry: AgentToolRegistry,
        options: CompletionOptions,
        max_iterations: usize,
    ) -> Self {
        Self {
            provider,
            registry,
            options,
            max_iterations,
        }
    }

    /// Spawn the assistant loop and return a handle for submitting questions.
    /// The task exits when the token is cancelled or all handles are dropped.
    pub fn spawn(self, shutdown: CancellationToken) -> AgentHandle {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(self.run(rx, shutdown));
        AgentHandle { tx }
    }

    async fn run(
        self,
        mut rx: mpsc::Receiver<AgentRequest>,
        shutdown: CancellationToken,
    ) {
        if let Err(e) = self.provider.health_check().await {
            warn!(provider = self.provider.name(), "LLM health check failed: {e}");
        }
        info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            "Assistant started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                request = rx.recv() => {
                    let Some(request) = request else { break };
                    let answer = self.answer(&request.question).await;
                    if request.reply.send(answer).is_err() {
                        debug!("Assistant caller went away before the answer arrived");
                    }
                }
            }
        }
        info!("Assistant stopped");
    }

    async fn answer(&self, question: &str) -> Result<String, AgentError> {
        let mut messages = vec![Message::system(SYSTEM_PROMPT), Message::user(question)];
        let definitions = self.registry.definitions();
        let tools = (!definitions.is_empty()).then_some(definitions.as_slice());

        for _ in 0..self.max_iterations {
            let response = self
                .provider
                .complete(&messages, tools, &self.options)
                .await?;

            if response.finish_reason != FinishReason::ToolCalls {
                return Ok(response.message.content.clone());
            }

            let calls = response.tool_calls().to_vec();
            messages.push(response.message);

            for call in calls {
                let result = match self.registry.get(&call.name) {
                    Some(tool) => match tool.execute(&call.arguments).await {
                        Ok(value) => value,
                        Err(e) => {
                            warn!(tool = %call.name, "Tool call failed: {e}");
                            json!({"error": e.to_string()})
                        }
                    },
                    None => {
                        error!(tool = %call.name, "Model requested an unknown tool");
                        json!({"error": format!("unknown tool {:?}", call.name)})
                    }
                };
                messages.push(Message::tool_result(
                    call.id,
                    call.name,
                    result.to_string(),
                ));
            }
        }

        Err(AgentError::IterationsExhausted(self.max_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::{CompletionResponse, MessageRole, ToolCall};
    use crate::agent::tools::{AgentTool, ToolDefinition, ToolError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted provider: yields each canned response in order.
    struct ScriptedProvider {
        responses: Vec<CompletionResponse>,
        next: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses,
                next: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, LlmError> {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(i)
                .cloned()
                .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
        }

        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    struct CountingTool(Arc<AtomicUsize>);

    #[async_trait]
    impl AgentTool for CountingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "count".to_string(),
                description: "Counts calls".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn execute(
            &self,
            _arguments: &serde_json::Value,
        ) -> Result<serde_json::Value, ToolError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"ok": true}))
        }
    }

    fn text_response(content: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(content),
            finish_reason: FinishReason::Stop,
        }
    }

    fn tool_response(name: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message {
                role: MessageRole::Assistant,
                content: String::new(),
                tool_calls: Some(vec![ToolCall {
                    id: "call_0".to_string(),
                    name: name.to_string(),
                    arguments: json!({}),
                }]),
                tool_call_id: None,
                tool_name: None,
            },
            finish_reason: FinishReason::ToolCalls,
        }
    }

    #[tokio::test]
    async fn answers_without_tools() {
        let agent = CatalogAgent::new(
            Box::new(ScriptedProvider::new(vec![text_response("42")])),
            AgentToolRegistry::new(),
            CompletionOptions::default(),
            3,
        );
        let handle = agent.spawn(CancellationToken::new());
        assert_eq!(handle.ask("meaning of life?".to_string()).await.unwrap(), "42");
    }

    #[tokio::test]
    async fn runs_requested_tools_before_answering() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = AgentToolRegistry::new();
        registry.register(Arc::new(CountingTool(calls.clone())));

        let agent = CatalogAgent::new(
            Box::new(ScriptedProvider::new(vec![
                tool_response("count"),
                text_response("done"),
            ])),
            registry,
            CompletionOptions::default(),
            3,
        );
        let handle = agent.spawn(CancellationToken::new());
        assert_eq!(handle.ask("count something".to_string()).await.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_the_model() {
        let agent = CatalogAgent::new(
            Box::new(ScriptedProvider::new(vec![
                tool_response("nope"),
                text_response("recovered"),
            ])),
            AgentToolRegistry::new(),
            CompletionOptions::default(),
            3,
        );
        let handle = agent.spawn(CancellationToken::new());
        assert_eq!(handle.ask("q".to_string()).await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn gives_up_after_max_iterations() {
        let agent = CatalogAgent::new(
            Box::new(ScriptedProvider::new(vec![
                tool_response("nope"),
                tool_response("nope"),
            ])),
            AgentToolRegistry::new(),
            CompletionOptions::default(),
            2,
        );
        let handle = agent.spawn(CancellationToken::new());
        let err = handle.ask("q".to_string()).await.unwrap_err();
        assert!(matches!(err, AgentError::IterationsExhausted(2)));
    }

    #[tokio::test]
    async fn model_error_propagates() {
        let agent = CatalogAgent::new(
            Box::new(ScriptedProvider::new(vec![])),
            AgentToolRegistry::new(),
            CompletionOptions::default(),
            3,
        );
        let handle = agent.spawn(CancellationToken::new());
        let err = handle.ask("q".to_string()).await.unwrap_err();
        assert!(matches!(err, AgentError::Model(_)));
    }
}
