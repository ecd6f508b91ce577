//! Mock Web Search
//!
//! Stands in for a real search backend. Every call fabricates between three
//! and seven results drawn from a fixed list of source names, sorted by a
//! random relevance score.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::tools::{Tool, ToolInput, ToolKind};
use crate::types::{ToolError, ToolResult};
use crate::utils::logger::{LogLevel, LogSink};

/// Source names the mock search draws from
pub const SOURCES: [&str; 5] = [
    "Academic Research Database",
    "Industry News Portal",
    "Government Statistics Site",
    "Technical Blog",
    "Nonprofit Organization Report",
];

/// Topic keyword table used to tag a query
const TOPICS: [(&str, &[&str]); 3] = [
    (
        "environmental impact",
        &["sustainability", "carbon footprint", "energy consumption"],
    ),
    (
        "market potential",
        &["growth", "opportunities", "trends", "forecast"],
    ),
    (
        "cryptocurrency",
        &["blockchain", "mining", "bitcoin", "ethereum"],
    ),
];

/// A single fabricated search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub source: String,
    pub summary: String,
    /// Relevance in [0.5, 1.0], two decimals
    pub relevance_score: f64,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub count: usize,
    pub topics: Vec<String>,
}

pub struct WebSearchTool {
    logger: Arc<dyn LogSink>,
}

impl WebSearchTool {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self { logger }
    }

    /// Build the full response for `query`
    pub fn search(&self, query: &str) -> SearchResponse {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(3..=7);
        let title_prefix = capitalize(query);
        let slug = query.replace(' ', "-");

        let mut results: Vec<SearchResult> = (0..count)
            .map(|i| {
                let source = SOURCES.choose(&mut rng).copied().unwrap_or(SOURCES[0]);
                let relevance: f64 = rng.gen_range(0.5..=1.0);
                SearchResult {
                    title: format!("{} - {}", title_prefix, source),
                    url: format!("https://example.com/{}-{}", slug, i),
                    source: source.to_string(),
                    summary: mock_summary(query, source, rng.gen_range(0..4)),
                    relevance_score: (relevance * 100.0).round() / 100.0,
                    date: format!(
                        "2023-{:02}-{:02}",
                        rng.gen_range(1..=12),
                        rng.gen_range(1..=28)
                    ),
                }
            })
            .collect();

        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        SearchResponse {
            status: "success".to_string(),
            query: query.to_string(),
            count: results.len(),
            results,
            topics: extract_topics(query),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    async fn execute(&self, input: ToolInput<'_>) -> ToolResult<Value> {
        let ToolInput::Search { query, context } = input else {
            return Err(ToolError::UnexpectedInput {
                tool: self.kind(),
                received: input.name(),
            });
        };

        self.logger.log(
            LogLevel::Tool,
            &format!("Executing web search for: {}", query),
        );
        if !context.is_empty() {
            self.logger.log(
                LogLevel::Info,
                &format!("Search context carries {} entries", context.len()),
            );
        }

        let response = self.search(query);
        serde_json::to_value(&response).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

/// Uppercase the first character and lowercase the rest
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn mock_summary(query: &str, source: &str, variant: usize) -> String {
    match variant {
        0 => format!(
            "A comprehensive analysis of {} from {} showing recent trends.",
            query, source
        ),
        1 => format!("{}'s perspective on {} with supporting data.", source, query),
        2 => format!("Key findings about {} based on research from {}.", query, source),
        _ => format!("Recent developments in {} as reported by {}.", query, source),
    }
}

/// Keywords for every topic mentioned in the query
pub fn extract_topics(query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let topics: Vec<String> = TOPICS
        .iter()
        .filter(|(topic, _)| query_lower.contains(topic))
        .flat_map(|(_, keywords)| keywords.iter().map(|k| k.to_string()))
        .collect();

    if topics.is_empty() {
        vec!["general research".to_string()]
    } else {
        topics
    }
}
