// Research Agent - decomposes a query into tool-driven tasks and reports on them

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod tools;
pub mod search;    // Mock web search
pub mod analysis;  // Mock data analyzer
pub mod utils;

// Re-exports for convenience
pub use agents::{execute_research_pipeline, ResearchAgent};
pub use config::Config;
pub use models::{AgentStatus, Finding, RunOutcome, Task, TaskStatus};
pub use types::{AgentError, AgentResult, ToolError};
