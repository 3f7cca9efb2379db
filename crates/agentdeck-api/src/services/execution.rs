// Agent execution service
//
// One execution is one RUNNING row followed by exactly one terminal update.
// Precondition failures (missing agent, inactive agent) return before the row
// exists; anything that fails after it exists ends the row and reports the
// execution id to the caller.

use agentdeck_core::{
    Agent, Completion, CompletionRequest, ErrorReport, ErrorType, Execution, ExecutionFilter,
    ExecutionMetrics, ExecutionOutcome, ExecutionStatus, LlmClient, LlmError, NewExecution,
    NewExecutionLog, Store, TextStream,
};
use chrono::Utc;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::executions::{ExecutionDetail, ExecutionResult, StreamEvent};
use crate::api::{ApiError, ApiResult};

/// Events buffered between the relay task and the HTTP response
const STREAM_BUFFER: usize = 32;

const DISCONNECT_REASON: &str = "Client disconnected before the execution completed";

pub struct ExecutionService {
    store: Arc<dyn Store>,
    llm: Arc<dyn LlmClient>,
}

impl ExecutionService {
    pub fn new(store: Arc<dyn Store>, llm: Arc<dyn LlmClient>) -> Self {
        Self { store, llm }
    }

    /// Agent the requester may execute right now
    pub async fn runnable_agent(&self, agent_id: Uuid, user_id: Uuid) -> ApiResult<Agent> {
        let agent = self
            .store
            .get_agent(agent_id)
            .await?
            .filter(|a| a.is_visible_to(Some(user_id)))
            .ok_or_else(|| ApiError::not_found("Agent not found"))?;

        if !agent.is_runnable() {
            return Err(ApiError::invalid_state(format!(
                "Agent is not active (status: {})",
                agent.status
            )));
        }
        Ok(agent)
    }

    /// Run the agent and wait for the whole completion
    pub async fn execute(
        &self,
        agent: &Agent,
        user_id: Uuid,
        input: String,
    ) -> ApiResult<ExecutionResult> {
        let execution = self.start(agent, user_id, &input).await?;
        let run = Run {
            store: self.store.clone(),
            agent: agent.clone(),
            execution,
        };
        // Dropping this future before the terminal update cancels the row
        let guard = CancelOnDrop::new(run.clone());

        let result = run.complete(&self.llm, input).await;
        let result = match result {
            Ok(result) => Ok(result),
            Err(err @ ApiError::Upstream { .. }) => Err(err),
            Err(err) => Err(run.abort(err).await),
        };
        guard.disarm();
        result
    }

    /// Run the agent and relay the completion as events.
    ///
    /// The relay runs on its own task; the returned receiver is the
    /// response body. Dropping the receiver cancels the execution.
    pub async fn execute_stream(
        &self,
        agent: Agent,
        user_id: Uuid,
        input: String,
    ) -> ApiResult<mpsc::Receiver<StreamEvent>> {
        let execution = self.start(&agent, user_id, &input).await?;
        let request = completion_request(&agent, input);
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        let run = Run {
            store: self.store.clone(),
            agent,
            execution,
        };
        let llm = self.llm.clone();
        tokio::spawn(async move { run.relay(llm, request, tx).await });

        Ok(rx)
    }

    /// Newest executions of a user
    pub async fn history(
        &self,
        user_id: Uuid,
        agent_id: Option<Uuid>,
        status: Option<ExecutionStatus>,
        limit: usize,
    ) -> ApiResult<Vec<Execution>> {
        let filter = ExecutionFilter {
            agent_id,
            status,
            limit,
            ..ExecutionFilter::for_user(user_id)
        };
        Ok(self.store.list_executions(filter).await?)
    }

    pub async fn detail(&self, execution_id: Uuid, user_id: Uuid) -> ApiResult<ExecutionDetail> {
        let execution = self
            .store
            .get_execution(execution_id)
            .await?
            .filter(|e| e.user_id == user_id)
            .ok_or_else(|| ApiError::not_found("Execution not found"))?;
        let logs = self.store.list_logs(execution_id).await?;
        Ok(ExecutionDetail { execution, logs })
    }

    /// Insert the RUNNING row and its first log line
    async fn start(&self, agent: &Agent, user_id: Uuid, input: &str) -> ApiResult<Execution> {
        let execution = self
            .store
            .create_execution(NewExecution {
                user_id,
                agent_id: agent.id,
                input: json!({ "message": input }),
                started_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            execution_id = %execution.id,
            agent_id = %agent.id,
            model = %agent.model,
            "agent execution started"
        );

        let log = NewExecutionLog::info(
            execution.id,
            "Agent execution started",
            json!({
                "model": agent.model,
                "temperature": agent.temperature,
                "maxTokens": agent.max_tokens,
            }),
        );
        if let Err(e) = self.store.append_log(log).await {
            let run = Run {
                store: self.store.clone(),
                agent: agent.clone(),
                execution,
            };
            return Err(run.abort(e.into()).await);
        }

        Ok(execution)
    }
}

fn completion_request(agent: &Agent, input: String) -> CompletionRequest {
    CompletionRequest::for_agent(
        agent.model.clone(),
        agent.system_prompt.as_deref(),
        input,
        agent.temperature,
        agent.max_tokens,
    )
}

/// How a streamed relay ended
enum RelayEnd {
    Completed(String),
    Failed(LlmError),
    Disconnected,
}

/// One execution past its RUNNING insert
#[derive(Clone)]
struct Run {
    store: Arc<dyn Store>,
    agent: Agent,
    execution: Execution,
}

impl Run {
    fn id(&self) -> Uuid {
        self.execution.id
    }

    async fn complete(&self, llm: &Arc<dyn LlmClient>, input: String) -> ApiResult<ExecutionResult> {
        let request = completion_request(&self.agent, input);
        match llm.chat_completion(request).await {
            Ok(completion) => self.succeed(completion).await,
            Err(err) => {
                self.fail(&err).await?;
                Err(ApiError::upstream(err, self.id()))
            }
        }
    }

    async fn succeed(&self, completion: Completion) -> ApiResult<ExecutionResult> {
        let output = json!({
            "message": completion.content,
            "usage": completion.usage,
            "model": completion.model,
        });
        let finished = self
            .finish(ExecutionOutcome::Succeeded { output })
            .await?;
        let duration = finished.duration.unwrap_or_default();
        let usage = completion.usage.unwrap_or_default();

        self.store
            .append_log(NewExecutionLog::info(
                self.id(),
                "Agent execution completed",
                json!({
                    "duration": duration,
                    "outputLength": completion.content.chars().count(),
                    "totalTokens": usage.total_tokens,
                }),
            ))
            .await?;
        self.store
            .record_analytics(
                ExecutionMetrics {
                    agent_id: self.agent.id,
                    user_id: self.execution.user_id,
                    model: completion.model.clone(),
                    duration,
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                    output_length: None,
                }
                .into(),
            )
            .await?;

        tracing::info!(execution_id = %self.id(), duration_ms = duration, "agent execution succeeded");
        Ok(ExecutionResult {
            execution_id: self.id(),
            output: completion.content,
            usage: completion.usage,
            duration,
            model: completion.model,
        })
    }

    /// Record an upstream failure
    async fn fail(&self, err: &LlmError) -> ApiResult<()> {
        tracing::warn!(
            execution_id = %self.id(),
            status = ?err.status,
            error = %err.message,
            "agent execution failed"
        );

        let finished = self
            .finish(ExecutionOutcome::Failed {
                error: err.message.clone(),
            })
            .await?;
        self.store
            .append_log(NewExecutionLog::error(
                self.id(),
                "Agent execution failed",
                json!({
                    "error": err.message,
                    "status": err.status,
                    "duration": finished.duration,
                }),
            ))
            .await?;
        self.store
            .record_analytics(
                ErrorReport {
                    agent_id: self.agent.id,
                    user_id: self.execution.user_id,
                    error: err.message.clone(),
                    error_type: ErrorType::LlmError,
                }
                .into(),
            )
            .await?;
        Ok(())
    }

    async fn finish(&self, outcome: ExecutionOutcome) -> ApiResult<Execution> {
        self.store
            .finish_execution(self.id(), outcome, Utc::now())
            .await?
            .ok_or_else(|| ApiError::internal(format!("execution {} already finished", self.id())))
    }

    /// Best-effort terminal update after an unexpected failure.
    /// Returns the error to report, tagged with the execution id.
    async fn abort(&self, err: ApiError) -> ApiError {
        tracing::error!(execution_id = %self.id(), error = %err, "agent execution aborted");

        let message = err.to_string();
        if let Err(e) = self
            .store
            .finish_execution(
                self.id(),
                ExecutionOutcome::Failed {
                    error: message.clone(),
                },
                Utc::now(),
            )
            .await
        {
            tracing::error!(execution_id = %self.id(), error = %e, "failed to mark execution failed");
        }

        let report = ErrorReport {
            agent_id: self.agent.id,
            user_id: self.execution.user_id,
            error: message,
            error_type: ErrorType::SystemError,
        };
        if let Err(e) = self.store.record_analytics(report.into()).await {
            tracing::error!(execution_id = %self.id(), error = %e, "failed to record error analytics");
        }

        err.for_execution(self.id())
    }

    /// Forward upstream fragments to `tx` until the upstream ends, fails or
    /// the receiver goes away, then persist the matching terminal state.
    async fn relay(
        self,
        llm: Arc<dyn LlmClient>,
        request: CompletionRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) {
        let end = tokio::select! {
            _ = tx.closed() => RelayEnd::Disconnected,
            opened = llm.chat_completion_stream(request) => match opened {
                Ok(upstream) => forward(upstream, &tx).await,
                Err(err) => RelayEnd::Failed(err),
            },
        };

        match end {
            RelayEnd::Completed(full_content) => self.stream_succeeded(full_content, &tx).await,
            RelayEnd::Failed(err) => {
                let error = match self.fail(&err).await {
                    Ok(()) => err.message,
                    Err(e) => self.abort(e).await.to_body().error,
                };
                let _ = tx
                    .send(StreamEvent::Error {
                        error,
                        execution_id: Some(self.id()),
                    })
                    .await;
            }
            RelayEnd::Disconnected => self.cancel().await,
        }
    }

    async fn stream_succeeded(&self, full_content: String, tx: &mpsc::Sender<StreamEvent>) {
        let persisted = self.persist_stream(&full_content).await;
        let event = match persisted {
            Ok(duration) => StreamEvent::Complete {
                execution_id: self.id(),
                duration,
                full_content,
            },
            Err(e) => StreamEvent::Error {
                error: self.abort(e).await.to_body().error,
                execution_id: Some(self.id()),
            },
        };
        let _ = tx.send(event).await;
    }

    async fn persist_stream(&self, full_content: &str) -> ApiResult<i64> {
        let finished = self
            .finish(ExecutionOutcome::Succeeded {
                output: json!({ "message": full_content, "model": self.agent.model }),
            })
            .await?;
        let duration = finished.duration.unwrap_or_default();
        let output_length = full_content.chars().count();

        self.store
            .append_log(NewExecutionLog::info(
                self.id(),
                "Agent streaming execution completed",
                json!({ "duration": duration, "outputLength": output_length }),
            ))
            .await?;
        // The provider reports no usage on streamed completions
        self.store
            .record_analytics(
                ExecutionMetrics {
                    agent_id: self.agent.id,
                    user_id: self.execution.user_id,
                    model: self.agent.model.clone(),
                    duration,
                    output_length: Some(output_length),
                    ..Default::default()
                }
                .into(),
            )
            .await?;

        tracing::info!(execution_id = %self.id(), duration_ms = duration, "streamed execution succeeded");
        Ok(duration)
    }

    async fn cancel(&self) {
        tracing::warn!(execution_id = %self.id(), "client disconnected, cancelling execution");

        let cancelled = self
            .store
            .finish_execution(
                self.id(),
                ExecutionOutcome::Cancelled {
                    reason: DISCONNECT_REASON.to_string(),
                },
                Utc::now(),
            )
            .await;
        let finished = match cancelled {
            Ok(Some(finished)) => finished,
            Ok(None) => {
                tracing::debug!(execution_id = %self.id(), "execution already finished, nothing to cancel");
                return;
            }
            Err(e) => {
                tracing::error!(execution_id = %self.id(), error = %e, "failed to cancel execution");
                return;
            }
        };

        let log = NewExecutionLog::warn(
            self.id(),
            "Agent execution cancelled",
            json!({
                "reason": DISCONNECT_REASON,
                "duration": finished.duration,
            }),
        );
        if let Err(e) = self.store.append_log(log).await {
            tracing::error!(execution_id = %self.id(), error = %e, "failed to log cancellation");
        }
    }
}

/// Cancels a synchronous execution whose request future is dropped
/// (the client went away) before the terminal update ran.
struct CancelOnDrop {
    run: Option<Run>,
}

impl CancelOnDrop {
    fn new(run: Run) -> Self {
        Self { run: Some(run) }
    }

    fn disarm(mut self) {
        self.run = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { run.cancel().await });
            }
            Err(_) => {
                tracing::error!(execution_id = %run.id(), "no runtime to cancel dropped execution");
            }
        }
    }
}

/// Relay loop: one chunk event per upstream fragment
async fn forward(mut upstream: TextStream, tx: &mpsc::Sender<StreamEvent>) -> RelayEnd {
    let mut accumulated = String::new();
    loop {
        let next = tokio::select! {
            _ = tx.closed() => return RelayEnd::Disconnected,
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(content)) => {
                accumulated.push_str(&content);
                let event = StreamEvent::Chunk {
                    content,
                    accumulated: accumulated.clone(),
                };
                if tx.send(event).await.is_err() {
                    return RelayEnd::Disconnected;
                }
            }
            Some(Err(err)) => return RelayEnd::Failed(err),
            None => return RelayEnd::Completed(accumulated),
        }
    }
}
