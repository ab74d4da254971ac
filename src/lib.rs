//! Marketing-site analysis: fetches a page, runs business-framework
//! analyses through an LLM, gathers performance and search data, and
//! aggregates everything into one report.

pub mod analysis;
pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod frameworks;
pub mod llm;
pub mod parsers;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod results;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for convenience
pub use config::{ApiKeys, AppConfig};
pub use error::{AnalysisError, Result};
pub use pipeline::{AnalysisRequest, Pipeline, StepByStepResult};
pub use results::{ComprehensiveAnalysisResult, FrameworkKind};
