// Planning agent: turns a research query into a fixed three-task plan

use crate::models::Task;
use crate::tools::ToolKind;
use crate::utils::logger::{LogLevel, LogSink};

const ENVIRONMENTAL_TRIGGER: &str = "environmental impact";

pub struct PlanningAgent;

impl PlanningAgent {
    /// Decompose `query` into exactly three tasks.
    ///
    /// Queries mentioning "environmental impact" (any case) get the
    /// environmental plan; everything else gets the generic plan with the
    /// query interpolated into each description.
    pub fn decompose(query: &str, logger: &dyn LogSink) -> Vec<Task> {
        logger.log(LogLevel::Agent, &format!("Decomposing query: {}", query));

        if query.to_lowercase().contains(ENVIRONMENTAL_TRIGGER) {
            Self::environmental_plan()
        } else {
            Self::generic_plan(query)
        }
    }

    fn environmental_plan() -> Vec<Task> {
        vec![
            Task::builder("Find current statistics on environmental impact")
                .tools([ToolKind::WebSearch, ToolKind::DataAnalyzer])
                .build(),
            Task::builder("Identify key contributing factors")
                .tools([ToolKind::WebSearch, ToolKind::DataAnalyzer])
                .build(),
            Task::builder("Research sustainable alternatives")
                .tool(ToolKind::WebSearch)
                .build(),
        ]
    }

    fn generic_plan(query: &str) -> Vec<Task> {
        vec![
            Task::builder(format!("Background research on {}", query))
                .tool(ToolKind::WebSearch)
                .build(),
            Task::builder(format!("Analyze current trends in {}", query))
                .tools([ToolKind::WebSearch, ToolKind::DataAnalyzer])
                .build(),
            Task::builder(format!("Recommendations regarding {}", query))
                .tools([ToolKind::WebSearch, ToolKind::DataAnalyzer])
                .build(),
        ]
    }
}
