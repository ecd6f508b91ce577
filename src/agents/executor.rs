//! Task Executor
//!
//! Runs one task's tool chain under the retry policy. A fresh context map is
//! threaded through the chain: search output lands under `search_results`,
//! analyzer output under `analysis`, and the analyzer reads whatever search
//! put there. The last tool's output becomes the task result.

use serde_json::Value;
use std::sync::Arc;

use crate::models::{empty_mapping, Task};
use crate::tools::{ToolContext, ToolInput, ToolKind, ToolSet, ANALYSIS_KEY, SEARCH_RESULTS_KEY};
use crate::types::{AgentError, AgentResult};
use crate::utils::logger::{LogLevel, LogSink, TaskEvent};
use crate::utils::retry::{with_retry_notify, RetryPolicy};

pub struct TaskRunner {
    tools: ToolSet,
    retry: RetryPolicy,
    logger: Arc<dyn LogSink>,
}

impl TaskRunner {
    pub fn new(tools: ToolSet, retry: RetryPolicy, logger: Arc<dyn LogSink>) -> Self {
        Self {
            tools,
            retry,
            logger,
        }
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Execute `task`, retrying the whole chain on failure.
    ///
    /// On success the task is completed with the chain output. On failure the
    /// task is left in progress and the last error is returned; marking it
    /// failed is the caller's call.
    pub async fn execute(&self, task: &mut Task) -> AgentResult<Value> {
        task.start();
        self.logger.task(task.description(), TaskEvent::Started);
        tracing::debug!(task_id = %task.id(), tools = task.required_tools().len(), "Executing task");

        let description = task.description().to_owned();
        let chain = task.required_tools().to_vec();
        let (description, chain) = (description.as_str(), chain.as_slice());

        let output = with_retry_notify(
            &self.retry,
            self.logger.as_ref(),
            move || self.run_chain(description, chain),
            |_, _| self.logger.task(description, TaskEvent::Retry),
        )
        .await?;

        task.complete(output.clone());
        self.logger.task(task.description(), TaskEvent::Completed);
        Ok(output)
    }

    /// One attempt at the chain; the first failing tool aborts the rest.
    async fn run_chain(&self, description: &str, chain: &[ToolKind]) -> AgentResult<Value> {
        let mut context = ToolContext::new();
        let mut result = empty_mapping();

        for &kind in chain {
            let tool = self.tools.get(kind);
            let outcome = match kind {
                ToolKind::WebSearch => {
                    tool.execute(ToolInput::Search {
                        query: description,
                        context: &context,
                    })
                    .await
                }
                ToolKind::DataAnalyzer => {
                    let empty = empty_mapping();
                    let data = context.get(SEARCH_RESULTS_KEY).unwrap_or(&empty);
                    tool.execute(ToolInput::Analyze { data }).await
                }
                ToolKind::ReportGenerator => {
                    self.logger.log(
                        LogLevel::Error,
                        &format!("Tool {} cannot be part of a task chain", kind),
                    );
                    return Err(AgentError::NotChainable(kind));
                }
            };

            let output = match outcome {
                Ok(output) => output,
                Err(e) => {
                    self.logger
                        .log(LogLevel::Error, &format!("Tool {} failed: {}", kind, e));
                    return Err(e.into());
                }
            };

            match kind {
                ToolKind::WebSearch => {
                    context.insert(SEARCH_RESULTS_KEY.to_string(), output.clone());
                }
                ToolKind::DataAnalyzer => {
                    context.insert(ANALYSIS_KEY.to_string(), output.clone());
                }
                ToolKind::ReportGenerator => {}
            }

            self.logger
                .log(LogLevel::Tool, &format!("Tool {} executed successfully", kind));
            result = output;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::tools::test_helpers::{FixedTool, ScriptedSearch};
    use crate::types::ToolError;
    use crate::utils::logger::MemorySink;
    use serde_json::json;
    use std::time::Duration;

    fn runner_with(tools: ToolSet, sink: Arc<MemorySink>) -> TaskRunner {
        TaskRunner::new(tools, RetryPolicy::new(3, Duration::ZERO, 2.0), sink)
    }

    #[tokio::test]
    async fn test_empty_chain_completes_with_empty_mapping() {
        let sink = MemorySink::new();
        let runner = runner_with(ToolSet::standard(sink.clone()), sink);
        let mut task = Task::builder("nothing to do").build();

        let output = runner.execute(&mut task).await.unwrap();

        assert_eq!(output, json!({}));
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.result(), Some(&json!({})));
    }

    #[tokio::test]
    async fn test_search_then_analyze_threads_context() {
        let sink = MemorySink::new();
        let runner = runner_with(ToolSet::standard(sink.clone()), sink);
        let mut task = Task::builder("Analyze current trends in solar")
            .tools([ToolKind::WebSearch, ToolKind::DataAnalyzer])
            .build();

        let output = runner.execute(&mut task).await.unwrap();

        // the analyzer saw the search output, so it reports a source count
        let first_insight = output["insights"][0].as_str().unwrap();
        assert!(first_insight.starts_with("Found "));
        assert!(first_insight.ends_with(" relevant sources"));
        assert_eq!(task.status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_analyzer_without_search_fails_after_retries() {
        let sink = MemorySink::new();
        let runner = runner_with(ToolSet::standard(sink.clone()), sink.clone());
        let mut task = Task::builder("analysis only")
            .tool(ToolKind::DataAnalyzer)
            .build();

        let err = runner.execute(&mut task).await.unwrap_err();

        assert!(matches!(err, AgentError::Tool(ToolError::NoData)));
        assert_eq!(task.status(), TaskStatus::InProgress);
        assert!(task.result().is_none());
        // two retry warnings plus two task retry markers
        assert_eq!(sink.at_level(LogLevel::Warning).len(), 4);
        assert!(sink.contains("↻ analysis only - RETRY"));
    }

    #[tokio::test]
    async fn test_failing_tool_aborts_chain_each_attempt() {
        let sink = MemorySink::new();
        let search = ScriptedSearch::failing_on("broken");
        let analyzer = FixedTool::ok(ToolKind::DataAnalyzer, json!({"never": "reached"}));
        let tools = ToolSet::standard(sink.clone())
            .with_web_search(search.clone())
            .with_data_analyzer(analyzer);
        let runner = runner_with(tools, sink.clone());
        let mut task = Task::builder("broken task")
            .tools([ToolKind::WebSearch, ToolKind::DataAnalyzer])
            .build();

        let err = runner.execute(&mut task).await.unwrap_err();

        assert_eq!(search.calls(), 3);
        assert_eq!(
            err.to_string(),
            "Tool error: Tool execution failed: search unavailable for broken task"
        );
        assert!(!sink.contains("Tool data_analyzer executed successfully"));
    }

    #[tokio::test]
    async fn test_report_generator_is_not_chainable() {
        let sink = MemorySink::new();
        let runner = runner_with(ToolSet::standard(sink.clone()), sink);
        let mut task = Task::builder("misconfigured")
            .tool(ToolKind::ReportGenerator)
            .build();

        let err = runner.execute(&mut task).await.unwrap_err();

        assert!(matches!(
            err,
            AgentError::NotChainable(ToolKind::ReportGenerator)
        ));
    }
}
