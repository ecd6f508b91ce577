//! Search Module
//!
//! Provides the web search capability used by research tasks. There is no
//! real backend: [`WebSearchTool`] synthesizes placeholder results in memory.

pub mod web;

pub use web::{SearchResponse, SearchResult, WebSearchTool};
