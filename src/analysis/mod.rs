use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tools::{Tool, ToolInput, ToolKind, SEARCH_RESULTS_KEY};
use crate::types::{ToolError, ToolResult};
use crate::utils::logger::{LogLevel, LogSink};

/// Output of the mock analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub key_metrics: BTreeMap<String, Value>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    /// Canned analysis for input that carries search results
    fn from_sources(source_count: usize) -> Self {
        let key_metrics = BTreeMap::from([
            ("relevance_score".to_string(), Value::from(0.85)),
            ("sentiment".to_string(), Value::from("neutral")),
            ("trend".to_string(), Value::from("increasing")),
        ]);

        Self {
            key_metrics,
            insights: vec![
                format!("Found {} relevant sources", source_count),
                "Primary concerns: energy consumption and carbon footprint".to_string(),
                "Emerging solutions: renewable energy mining operations".to_string(),
            ],
            recommendations: vec![
                "Consider transitioning to proof-of-stake consensus".to_string(),
                "Explore renewable energy partnerships".to_string(),
                "Implement carbon offset programs".to_string(),
            ],
        }
    }

    fn generic() -> Self {
        Self {
            key_metrics: BTreeMap::new(),
            insights: vec!["No specific insights - generic data provided".to_string()],
            recommendations: vec!["Collect more specific data for better analysis".to_string()],
        }
    }
}

pub struct DataAnalyzerTool {
    logger: Arc<dyn LogSink>,
}

impl DataAnalyzerTool {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self { logger }
    }

    /// Analyze whatever the previous tool produced
    pub fn analyze(&self, data: &Value) -> ToolResult<AnalysisResult> {
        if is_empty(data) {
            return Err(ToolError::NoData);
        }

        Ok(match source_count(data) {
            Some(count) => AnalysisResult::from_sources(count),
            None => AnalysisResult::generic(),
        })
    }
}

#[async_trait]
impl Tool for DataAnalyzerTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DataAnalyzer
    }

    async fn execute(&self, input: ToolInput<'_>) -> ToolResult<Value> {
        let ToolInput::Analyze { data } = input else {
            return Err(ToolError::UnexpectedInput {
                tool: self.kind(),
                received: input.name(),
            });
        };

        self.logger.log(LogLevel::Tool, "Starting data analysis...");

        match self.analyze(data) {
            Ok(result) => {
                self.logger
                    .log(LogLevel::Success, "Data analysis completed successfully");
                serde_json::to_value(&result).map_err(|e| ToolError::Failed(e.to_string()))
            }
            Err(e) => {
                self.logger
                    .log(LogLevel::Error, &format!("Data analysis failed: {}", e));
                Err(e)
            }
        }
    }
}

fn is_empty(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Number of sources when `data` looks like search output, either directly
/// (a `results` array) or nested under `search_results`.
fn source_count(data: &Value) -> Option<usize> {
    if let Some(results) = data.get("results").and_then(Value::as_array) {
        return Some(results.len());
    }

    data.get(SEARCH_RESULTS_KEY).map(|nested| match nested {
        Value::Object(map) => map
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(map.len()),
        Value::Array(items) => items.len(),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logger::MemorySink;
    use serde_json::json;

    fn analyzer() -> DataAnalyzerTool {
        DataAnalyzerTool::new(MemorySink::new())
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(analyzer().analyze(&json!({})), Err(ToolError::NoData));
        assert_eq!(analyzer().analyze(&Value::Null), Err(ToolError::NoData));
    }

    #[test]
    fn test_search_output_gets_rich_analysis() {
        let data = json!({"status": "success", "results": [{}, {}, {}, {}], "count": 4});
        let result = analyzer().analyze(&data).unwrap();
        assert_eq!(result.insights[0], "Found 4 relevant sources");
        assert_eq!(result.key_metrics["trend"], "increasing");
        assert_eq!(result.recommendations.len(), 3);
    }

    #[test]
    fn test_nested_search_results() {
        let data = json!({"search_results": {"results": [{}, {}]}});
        let result = analyzer().analyze(&data).unwrap();
        assert_eq!(result.insights[0], "Found 2 relevant sources");
    }

    #[test]
    fn test_generic_input() {
        let result = analyzer().analyze(&json!({"numbers": [1, 2, 3]})).unwrap();
        assert!(result.key_metrics.is_empty());
        assert_eq!(
            result.recommendations,
            vec!["Collect more specific data for better analysis"]
        );
    }

    #[tokio::test]
    async fn test_execute_logs_failure() {
        let sink = MemorySink::new();
        let tool = DataAnalyzerTool::new(sink.clone());
        let data = json!({});

        let err = tool.execute(ToolInput::Analyze { data: &data }).await.unwrap_err();

        assert_eq!(err, ToolError::NoData);
        assert!(sink.contains("Data analysis failed: No data provided for analysis"));
    }
}
