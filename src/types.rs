// Error types shared across the pipeline

use crate::tools::ToolKind;

/// Failure raised by a single tool invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("No data provided for analysis")]
    NoData,

    #[error("{tool} cannot handle {received} input")]
    UnexpectedInput {
        tool: ToolKind,
        received: &'static str,
    },

    #[error("Tool execution failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Research query must not be empty")]
    EmptyQuery,

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("{0} cannot run inside a task chain")]
    NotChainable(ToolKind),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
pub type AgentResult<T> = std::result::Result<T, AgentError>;
