//! Report Generator
//!
//! Final step of the pipeline: folds the query, the per-task findings and the
//! task history into a markdown-ish text report. Generation failures are kept
//! local; whatever sections were already built come back as a partial report
//! with a `failed` status.

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{Finding, FindingOutcome, Task, TaskStatus};
use crate::tools::{Tool, ToolInput, ToolKind};
use crate::types::{ToolError, ToolResult};
use crate::utils::logger::{LogLevel, LogSink};

const NO_RECOMMENDATIONS: &str =
    "No specific recommendations could be generated from the research.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Failed,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Success => write!(f, "success"),
            ReportStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Structured output of the report tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub status: ReportStatus,
    pub report: String,
    pub summary: String,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_report: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum ReportError {
    #[error("Result for task '{0}' is not a mapping")]
    MalformedResult(String),
}

pub struct ReportGeneratorTool {
    logger: Arc<dyn LogSink>,
}

impl ReportGeneratorTool {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self { logger }
    }

    /// Build the report; never fails, but may come back with a failed status
    pub fn generate(&self, query: &str, findings: &[Finding], tasks: &[Task]) -> Report {
        self.logger.log(LogLevel::Tool, "Starting report generation...");

        let mut sections = Vec::new();
        let outcome = build_sections(&mut sections, query, findings, tasks);

        let text = if sections.is_empty() {
            "No report generated".to_string()
        } else {
            sections.join("\n")
        };
        let word_count = if sections.is_empty() {
            0
        } else {
            text.split_whitespace().count()
        };

        let report = match outcome {
            Ok(()) => Report {
                status: ReportStatus::Success,
                summary: short_summary(findings),
                report: text,
                word_count,
                error: None,
                partial_report: None,
            },
            Err(e) => {
                self.logger
                    .log(LogLevel::Error, &format!("Report generation failed: {}", e));
                Report {
                    status: ReportStatus::Failed,
                    summary: "Incomplete summary".to_string(),
                    partial_report: (!sections.is_empty()).then(|| text.clone()),
                    report: text,
                    word_count,
                    error: Some(e.to_string()),
                }
            }
        };

        let level = match report.status {
            ReportStatus::Success => LogLevel::Success,
            ReportStatus::Failed => LogLevel::Warning,
        };
        self.logger.log(
            level,
            &format!("Report generation completed with status: {}", report.status),
        );

        report
    }
}

#[async_trait]
impl Tool for ReportGeneratorTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ReportGenerator
    }

    async fn execute(&self, input: ToolInput<'_>) -> ToolResult<Value> {
        let ToolInput::Report {
            query,
            findings,
            tasks,
        } = input
        else {
            return Err(ToolError::UnexpectedInput {
                tool: self.kind(),
                received: input.name(),
            });
        };

        let report = self.generate(query, findings, tasks);
        serde_json::to_value(&report).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

/// Push sections in order; on error everything pushed so far stays.
fn build_sections(
    sections: &mut Vec<String>,
    query: &str,
    findings: &[Finding],
    tasks: &[Task],
) -> Result<(), ReportError> {
    sections.push(format!("# Research Report: {}", query));
    sections.push(format!(
        "**Generated on**: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    sections.push(format!("**Total Tasks**: {}", tasks.len()));

    sections.push("\n## Executive Summary".to_string());
    sections.push(executive_summary(findings));

    sections.push("\n## Detailed Findings".to_string());
    for (i, finding) in findings.iter().enumerate() {
        let number = i + 1;
        match &finding.outcome {
            FindingOutcome::Error(message) => {
                sections.push(format!("### Task {}: {} [FAILED]", number, finding.task));
                sections.push(format!("Error: {}", message));
            }
            FindingOutcome::Result(result) => {
                sections.push(format!("### Task {}: {}", number, finding.task));
                sections.push(format_finding(&finding.task, result)?);
            }
        }
    }

    sections.push("\n## Recommendations".to_string());
    sections.push(recommendations(findings));

    sections.push("\n## Task Execution Log".to_string());
    sections.push(task_log(tasks));

    Ok(())
}

fn executive_summary(findings: &[Finding]) -> String {
    let successful = findings.iter().filter(|f| f.is_success()).count();
    format!(
        "This research uncovered {} key findings. Primary insights include energy \
         consumption concerns and emerging solutions in renewable energy applications.",
        successful
    )
}

fn format_finding(task: &str, result: &Value) -> Result<String, ReportError> {
    let fields = result
        .as_object()
        .ok_or_else(|| ReportError::MalformedResult(task.to_string()))?;

    let mut lines = Vec::new();
    if let Some(metrics) = fields.get("key_metrics").and_then(Value::as_object) {
        lines.push("**Key Metrics**:".to_string());
        for (key, value) in metrics {
            lines.push(format!("- {}: {}", title_case(key), plain(value)));
        }
    }

    if let Some(insights) = fields.get("insights").and_then(Value::as_array) {
        lines.push("\n**Insights**:".to_string());
        lines.extend(insights.iter().map(|i| format!("- {}", plain(i))));
    }

    Ok(lines.join("\n"))
}

/// Unique recommendations across successful findings, sorted
fn recommendations(findings: &[Finding]) -> String {
    let unique: BTreeSet<String> = findings
        .iter()
        .filter_map(Finding::result)
        .filter_map(|result| result.get("recommendations").and_then(Value::as_array))
        .flatten()
        .map(plain)
        .collect();

    if unique.is_empty() {
        return NO_RECOMMENDATIONS.to_string();
    }

    unique
        .iter()
        .map(|r| format!("- {}", r))
        .collect::<Vec<_>>()
        .join("\n")
}

fn task_log(tasks: &[Task]) -> String {
    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let marker = if task.status() == TaskStatus::Completed {
                "✓"
            } else {
                "✗"
            };
            format!("{}. [{}] {}", i + 1, marker, task.description())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn short_summary(findings: &[Finding]) -> String {
    let successful = findings.iter().filter(|f| f.is_success()).count();
    format!(
        "Research completed with {}/{} successful findings",
        successful,
        findings.len()
    )
}

/// String values without JSON quotes, everything else as JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// "relevance_score" -> "Relevance Score"
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
