//! Agent System
//!
//! The research pipeline is driven by [`ResearchAgent`]:
//!
//! - **Planning**: decomposes the query into a fixed three-task plan
//! - **Executor**: runs each task's tool chain under the retry policy
//! - **Report**: folds findings and task history into the final document
//!
//! ## Pipeline Overview
//!
//! ```text
//! Research query
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Planning   │  → Three tasks with tool chains
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Executor   │  → One task at a time, retried on failure
//! └─────────────┘
//!      │  findings (result or error per task)
//!      ▼
//! ┌─────────────┐
//! │   Report    │  → Report object, or a failure envelope
//! └─────────────┘
//! ```

pub mod executor;
pub mod planning;
pub mod report;

pub use executor::TaskRunner;
pub use planning::PlanningAgent;
pub use report::{Report, ReportGeneratorTool, ReportStatus};

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::models::{
    empty_mapping, AgentStatus, Finding, RunFailure, RunOutcome, RunStatus, Task, TaskStatus,
};
use crate::tools::{ToolInput, ToolKind, ToolSet};
use crate::types::{AgentError, AgentResult};
use crate::utils::logger::{default_sink, LogLevel, LogSink, TaskEvent};
use crate::utils::retry::RetryPolicy;

/// Orchestrates one research query end to end
pub struct ResearchAgent {
    query: String,
    runner: TaskRunner,
    logger: Arc<dyn LogSink>,
    task_history: Vec<Task>,
    findings: Vec<Finding>,
    completed: bool,
}

pub struct ResearchAgentBuilder {
    query: String,
    tools: Option<ToolSet>,
    retry: RetryPolicy,
    logger: Option<Arc<dyn LogSink>>,
}

impl ResearchAgentBuilder {
    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> AgentResult<ResearchAgent> {
        if self.query.trim().is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        let logger = self.logger.unwrap_or_else(default_sink);
        let tools = self
            .tools
            .unwrap_or_else(|| ToolSet::standard(logger.clone()));

        Ok(ResearchAgent {
            query: self.query,
            runner: TaskRunner::new(tools, self.retry, logger.clone()),
            logger,
            task_history: Vec::new(),
            findings: Vec::new(),
            completed: false,
        })
    }
}

impl ResearchAgent {
    /// Agent with the standard mock tools and default retry policy
    pub fn new(query: impl Into<String>) -> AgentResult<Self> {
        Self::builder(query).build()
    }

    pub fn builder(query: impl Into<String>) -> ResearchAgentBuilder {
        ResearchAgentBuilder {
            query: query.into(),
            tools: None,
            retry: RetryPolicy::default(),
            logger: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn task_history(&self) -> &[Task] {
        &self.task_history
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn decompose_query(&self) -> Vec<Task> {
        PlanningAgent::decompose(&self.query, self.logger.as_ref())
    }

    /// Run a single task through its tool chain under the retry policy
    pub async fn execute_task(&self, task: &mut Task) -> AgentResult<Value> {
        self.runner.execute(task).await
    }

    /// Execute the whole research workflow.
    ///
    /// Task failures become error findings and never stop the run. Only a
    /// failing report tool turns the outcome into a failure envelope.
    pub async fn run(&mut self) -> RunOutcome {
        self.completed = false;
        self.findings.clear();

        let mut tasks = self.decompose_query();
        info!(
            query = %self.query,
            task_count = tasks.len(),
            "Planning complete"
        );

        for task in tasks.iter_mut() {
            match self.execute_task(task).await {
                Ok(result) => {
                    self.findings
                        .push(Finding::success(task.description(), result));
                }
                Err(e) => {
                    self.logger.log(
                        LogLevel::Error,
                        &format!(
                            "Task failed after retries: {}. Error: {}",
                            task.description(),
                            e
                        ),
                    );
                    task.fail();
                    self.logger.task(task.description(), TaskEvent::Failed);
                    self.findings
                        .push(Finding::failure(task.description(), e.to_string()));
                }
            }
        }
        self.task_history = tasks;

        let report = self
            .runner
            .tools()
            .get(ToolKind::ReportGenerator)
            .execute(ToolInput::Report {
                query: &self.query,
                findings: &self.findings,
                tasks: &self.task_history,
            })
            .await;

        match report {
            Ok(value) => {
                self.completed = true;
                let status = self.get_status();
                info!(
                    completed = status.tasks_completed,
                    failed = status.tasks_failed,
                    "Research pipeline complete"
                );
                self.logger.log(LogLevel::Success, "Research completed");
                RunOutcome::Report(if value.is_null() { empty_mapping() } else { value })
            }
            Err(e) => {
                self.logger
                    .log(LogLevel::Error, &format!("Research failed: {}", e));
                RunOutcome::Failed(RunFailure {
                    status: RunStatus::Failed,
                    error: e.to_string(),
                    partial_findings: self.findings.clone(),
                })
            }
        }
    }

    pub fn get_status(&self) -> AgentStatus {
        let count = |status: TaskStatus| {
            self.task_history
                .iter()
                .filter(|t| t.status() == status)
                .count()
        };

        AgentStatus {
            completed: self.completed,
            tasks_total: self.task_history.len(),
            tasks_completed: count(TaskStatus::Completed),
            tasks_failed: count(TaskStatus::Failed),
        }
    }
}

/// Build an agent from `config` and run `query` through the full pipeline
pub async fn execute_research_pipeline(
    query: &str,
    config: &Config,
    logger: Arc<dyn LogSink>,
) -> AgentResult<(RunOutcome, AgentStatus)> {
    info!(query_len = query.len(), "Starting research pipeline");

    let mut agent = ResearchAgent::builder(query)
        .retry(RetryPolicy::from_config(&config.retry))
        .logger(logger)
        .build()?;

    let outcome = agent.run().await;
    Ok((outcome, agent.get_status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_helpers::{FixedTool, ScriptedSearch};
    use crate::utils::logger::MemorySink;
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO, 2.0)
    }

    fn agent_with(query: &str, tools: impl FnOnce(ToolSet) -> ToolSet) -> ResearchAgent {
        let sink = MemorySink::new();
        ResearchAgent::builder(query)
            .tools(tools(ToolSet::standard(sink.clone())))
            .retry(fast_retry())
            .logger(sink)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_query_rejected() {
        assert!(matches!(
            ResearchAgent::new("   "),
            Err(AgentError::EmptyQuery)
        ));
    }

    #[test]
    fn test_status_before_run() {
        let agent = ResearchAgent::new("solar power").unwrap();
        assert_eq!(
            agent.get_status(),
            AgentStatus {
                completed: false,
                tasks_total: 0,
                tasks_completed: 0,
                tasks_failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_environmental_run_completes_every_task() {
        let mut agent = agent_with("Environmental impact of cryptocurrency mining", |t| t);

        let outcome = agent.run().await;

        let report = outcome.report().unwrap();
        assert_eq!(report["status"], "success");
        assert_eq!(
            report["summary"],
            "Research completed with 3/3 successful findings"
        );
        let text = report["report"].as_str().unwrap();
        assert!(text.contains("- Consider transitioning to proof-of-stake consensus"));
        assert!(agent.is_completed());
        assert!(agent
            .task_history()
            .iter()
            .all(|t| t.status() == TaskStatus::Completed && t.result().is_some()));
    }

    #[tokio::test]
    async fn test_one_failing_task_still_produces_report() {
        let mut agent = agent_with("solar power", |t| {
            t.with_web_search(ScriptedSearch::failing_on("Background research"))
        });

        let outcome = agent.run().await;

        assert!(!outcome.is_failed());
        let findings = agent.findings();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings.iter().filter(|f| f.error().is_some()).count(), 1);
        assert!(findings[0]
            .error()
            .unwrap()
            .contains("search unavailable for Background research on solar power"));

        let statuses: Vec<TaskStatus> = agent.task_history().iter().map(|t| t.status()).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Failed, TaskStatus::Completed, TaskStatus::Completed]
        );
        assert!(agent.task_history()[0].result().is_none());

        let report = outcome.report().unwrap();
        assert!(report["report"]
            .as_str()
            .unwrap()
            .contains("### Task 1: Background research on solar power [FAILED]"));
    }

    #[tokio::test]
    async fn test_status_after_partial_failure_is_stable() {
        let mut agent = agent_with("solar power", |t| {
            t.with_web_search(ScriptedSearch::failing_on("Recommendations"))
        });
        agent.run().await;

        let first = agent.get_status();
        let second = agent.get_status();

        assert_eq!(
            first,
            AgentStatus {
                completed: true,
                tasks_total: 3,
                tasks_completed: 2,
                tasks_failed: 1
            }
        );
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failing_report_tool_returns_envelope() {
        let mut agent = agent_with("solar power", |t| {
            t.with_report_generator(FixedTool::err(ToolKind::ReportGenerator, "printer on fire"))
        });

        let outcome = agent.run().await;

        let RunOutcome::Failed(failure) = &outcome else {
            panic!("expected failure envelope, got {:?}", outcome);
        };
        assert_eq!(failure.error, "Tool execution failed: printer on fire");
        assert_eq!(failure.partial_findings.len(), 3);
        assert!(!agent.is_completed());

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "failed");
    }

    #[tokio::test]
    async fn test_null_report_becomes_empty_mapping() {
        let mut agent = agent_with("solar power", |t| {
            t.with_report_generator(FixedTool::ok(ToolKind::ReportGenerator, Value::Null))
        });

        let outcome = agent.run().await;

        assert_eq!(outcome, RunOutcome::Report(json!({})));
        assert!(agent.is_completed());
        // no status key on this path
        assert_eq!(serde_json::to_value(&outcome).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_execute_task_completes_a_single_task() {
        let agent = agent_with("solar power", |t| t);
        let mut task = Task::builder("Look up solar capacity")
            .tool(ToolKind::WebSearch)
            .build();

        let result = agent.execute_task(&mut task).await.unwrap();

        assert_eq!(result["status"], "success");
        assert_eq!(task.status(), TaskStatus::Completed);
        assert!(agent.task_history().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_resets_findings() {
        let mut agent = agent_with("solar power", |t| t);
        agent.run().await;
        agent.run().await;

        assert_eq!(agent.findings().len(), 3);
        assert_eq!(agent.get_status().tasks_total, 3);
    }

    #[tokio::test]
    async fn test_pipeline_entry_point() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 0;

        let (outcome, status) =
            execute_research_pipeline("market potential of hydrogen", &config, MemorySink::new())
                .await
                .unwrap();

        assert!(!outcome.is_failed());
        assert_eq!(status.tasks_total, 3);
        assert!(status.completed);

        assert!(matches!(
            execute_research_pipeline("", &config, MemorySink::new()).await,
            Err(AgentError::EmptyQuery)
        ));
    }
}
