use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::tools::ToolKind;

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One decomposed unit of the research plan.
///
/// Built through [`Task::builder`]; only the executor moves it through its
/// lifecycle. A completed task always carries a result, a failed one never
/// does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    id: Uuid,
    description: String,
    required_tools: Vec<ToolKind>,
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl Task {
    pub fn builder(description: impl Into<String>) -> TaskBuilder {
        TaskBuilder {
            description: description.into(),
            required_tools: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required_tools(&self) -> &[ToolKind] {
        &self.required_tools
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub(crate) fn start(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub(crate) fn complete(&mut self, result: Value) {
        self.result = Some(result);
        self.status = TaskStatus::Completed;
    }

    pub(crate) fn fail(&mut self) {
        self.result = None;
        self.status = TaskStatus::Failed;
    }
}

#[derive(Debug, Clone)]
pub struct TaskBuilder {
    description: String,
    required_tools: Vec<ToolKind>,
}

impl TaskBuilder {
    /// Append a tool to the execution chain
    pub fn tool(mut self, tool: ToolKind) -> Self {
        self.required_tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = ToolKind>) -> Self {
        self.required_tools.extend(tools);
        self
    }

    pub fn build(self) -> Task {
        Task {
            id: Uuid::new_v4(),
            description: self.description,
            required_tools: self.required_tools,
            status: TaskStatus::Pending,
            result: None,
        }
    }
}

/// Outcome of a single task; exactly one of `result` / `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingOutcome {
    Result(Value),
    Error(String),
}

/// Per-task outcome record held by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub task: String,
    #[serde(flatten)]
    pub outcome: FindingOutcome,
}

impl Finding {
    pub fn success(task: impl Into<String>, result: Value) -> Self {
        Self {
            task: task.into(),
            outcome: FindingOutcome::Result(result),
        }
    }

    pub fn failure(task: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            outcome: FindingOutcome::Error(error.into()),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            FindingOutcome::Result(value) => Some(value),
            FindingOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            FindingOutcome::Error(message) => Some(message),
            FindingOutcome::Result(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FindingOutcome::Result(_))
    }
}

/// Snapshot returned by `ResearchAgent::get_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub completed: bool,
    pub tasks_total: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Failed,
}

/// Envelope returned when the run itself could not produce a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    pub status: RunStatus,
    pub error: String,
    pub partial_findings: Vec<Finding>,
}

/// What `ResearchAgent::run` hands back. Serializes as the report tool's
/// object as-is (`{}` when the tool returned nothing), or as the failure
/// envelope with `status: "failed"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Report(Value),
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }

    pub fn report(&self) -> Option<&Value> {
        match self {
            RunOutcome::Report(value) => Some(value),
            RunOutcome::Failed(_) => None,
        }
    }

    /// Text suitable for printing to the console
    pub fn render(&self) -> String {
        match self {
            RunOutcome::Report(value) => value
                .get("report")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            RunOutcome::Failed(failure) => format!(
                "Research failed: {} ({} partial findings)",
                failure.error,
                failure.partial_findings.len()
            ),
        }
    }
}

/// Empty JSON object, the result of a task with no tools
pub fn empty_mapping() -> Value {
    Value::Object(Map::new())
}
