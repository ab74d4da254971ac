use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::ToolsConfig;
use crate::error::{AnalysisError, Result};
use crate::results::{Availability, LighthouseScores};
use crate::tools::script::run_script;
use crate::tools::{MetricsSource, parse_categories};

const DEFAULT_COMMAND: &str = "lighthouse";

/// Runs the Lighthouse CLI locally
pub struct LocalLighthouse {
    command: String,
    timeout: Duration,
    max_output: usize,
}

impl LocalLighthouse {
    pub fn new(command: impl Into<String>, timeout: Duration, max_output: usize) -> Self {
        Self {
            command: command.into(),
            timeout,
            max_output,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            config
                .lighthouse_command
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
            Duration::from_secs(config.script_timeout_secs),
            config.script_max_output_bytes,
        )
    }

    pub async fn run(&self, url: &str) -> Result<LighthouseScores> {
        let args = [
            url,
            "--output=json",
            "--output-path=stdout",
            "--quiet",
            "--chrome-flags=--headless",
        ];
        let stdout = run_script(&self.command, &args, self.timeout, self.max_output).await?;
        let report: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| AnalysisError::Tool(format!("lighthouse output is not JSON: {}", e)))?;
        parse_categories(&report)
    }
}

#[async_trait]
impl MetricsSource for LocalLighthouse {
    fn name(&self) -> &str {
        "lighthouse"
    }

    async fn lighthouse(&self, url: &str) -> Availability<LighthouseScores> {
        let result = self.run(url).await;
        if let Err(e) = &result {
            ::log::warn!("Local lighthouse run for {} failed: {}", url, e);
        }
        result.into()
    }
}
