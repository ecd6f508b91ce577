//! Tool System
//!
//! Every capability the agent can invoke implements [`Tool`]. The set of
//! tools is closed: [`ToolKind`] names each one and [`ToolSet`] resolves a
//! kind to its instance with an exhaustive match, so there is no lookup by
//! string and no "unknown tool" at runtime.
//!
//! ```text
//!  Task chain                 Orchestrator
//!  ──────────                 ────────────
//!  WebSearch ──► context["search_results"]
//!  DataAnalyzer ─► context["analysis"]
//!                              ReportGenerator(query, findings, tasks)
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::agents::report::ReportGeneratorTool;
use crate::analysis::DataAnalyzerTool;
use crate::models::{Finding, Task};
use crate::search::WebSearchTool;
use crate::types::ToolResult;
use crate::utils::logger::{default_sink, LogSink};

/// Context key holding the web search output within a task chain
pub const SEARCH_RESULTS_KEY: &str = "search_results";
/// Context key holding the analyzer output within a task chain
pub const ANALYSIS_KEY: &str = "analysis";

/// Per-task accumulator threaded through a tool chain
pub type ToolContext = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    DataAnalyzer,
    ReportGenerator,
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::WebSearch => write!(f, "web_search"),
            ToolKind::DataAnalyzer => write!(f, "data_analyzer"),
            ToolKind::ReportGenerator => write!(f, "report_generator"),
        }
    }
}

/// Structured input for one tool call
#[derive(Debug, Clone, Copy)]
pub enum ToolInput<'a> {
    Search {
        query: &'a str,
        context: &'a ToolContext,
    },
    Analyze {
        data: &'a Value,
    },
    Report {
        query: &'a str,
        findings: &'a [Finding],
        tasks: &'a [Task],
    },
}

impl ToolInput<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ToolInput::Search { .. } => "search",
            ToolInput::Analyze { .. } => "analyze",
            ToolInput::Report { .. } => "report",
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    async fn execute(&self, input: ToolInput<'_>) -> ToolResult<Value>;
}

/// The fixed set of tools an agent owns
#[derive(Clone)]
pub struct ToolSet {
    web_search: Arc<dyn Tool>,
    data_analyzer: Arc<dyn Tool>,
    report_generator: Arc<dyn Tool>,
}

impl ToolSet {
    /// The mock search, analyzer and report tools
    pub fn standard(logger: Arc<dyn LogSink>) -> Self {
        Self {
            web_search: Arc::new(WebSearchTool::new(logger.clone())),
            data_analyzer: Arc::new(DataAnalyzerTool::new(logger.clone())),
            report_generator: Arc::new(ReportGeneratorTool::new(logger)),
        }
    }

    pub fn with_web_search(mut self, tool: Arc<dyn Tool>) -> Self {
        self.web_search = tool;
        self
    }

    pub fn with_data_analyzer(mut self, tool: Arc<dyn Tool>) -> Self {
        self.data_analyzer = tool;
        self
    }

    pub fn with_report_generator(mut self, tool: Arc<dyn Tool>) -> Self {
        self.report_generator = tool;
        self
    }

    pub fn get(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::WebSearch => self.web_search.as_ref(),
            ToolKind::DataAnalyzer => self.data_analyzer.as_ref(),
            ToolKind::ReportGenerator => self.report_generator.as_ref(),
        }
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::standard(default_sink())
    }
}
