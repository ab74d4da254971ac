use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use brandscope::AnalysisRequest;

#[derive(Parser, Debug)]
#[command(name = "brandscope")]
#[command(about = "Analyses marketing websites against business frameworks")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Analyse one URL and print the result as JSON
    Analyze(AnalyzeArgs),
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeArgs {
    /// Page to analyse
    pub url: String,

    /// Target keyword for trends and keyword hints
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Framework to run (repeatable); defaults to the standard four
    #[arg(short, long = "framework")]
    pub frameworks: Vec<String>,

    /// Collect Lighthouse scores
    #[arg(long)]
    pub lighthouse: bool,

    /// Audit same-site pages linked from the main page
    #[arg(long)]
    pub all_pages: bool,

    /// Fetch through a WebDriver browser so scripts run first
    #[arg(long)]
    pub render_js: bool,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl AnalyzeArgs {
    pub fn to_request(&self) -> AnalysisRequest {
        AnalysisRequest {
            url: self.url.clone(),
            keyword: self.keyword.clone(),
            frameworks: (!self.frameworks.is_empty()).then(|| self.frameworks.clone()),
            include_lighthouse: self.lighthouse,
            include_page_audit: self.all_pages,
            include_all_pages: self.all_pages,
            render_js: self.render_js,
        }
    }

    /// A browser is only worth connecting when something will use it
    pub fn needs_browser(&self) -> bool {
        self.render_js || self.keyword.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_flags_map_to_request() {
        let args = Args::parse_from([
            "brandscope",
            "analyze",
            "https://acme.test",
            "--keyword",
            "widgets",
            "--framework",
            "golden-circle",
            "-f",
            "revenue-trends",
            "--lighthouse",
        ]);
        let Command::Analyze(analyze) = args.command else {
            panic!("expected analyze");
        };
        let request = analyze.to_request();
        assert_eq!(request.url, "https://acme.test");
        assert_eq!(request.keyword.as_deref(), Some("widgets"));
        assert_eq!(
            request.frameworks,
            Some(vec!["golden-circle".to_string(), "revenue-trends".to_string()])
        );
        assert!(request.include_lighthouse);
        assert!(!request.include_all_pages);
        assert!(analyze.needs_browser());
    }

    #[test]
    fn test_serve_defaults() {
        let args = Args::parse_from(["brandscope", "serve", "--bind", "0.0.0.0:8080"]);
        match args.command {
            Command::Serve { config, bind } => {
                assert!(config.is_none());
                assert_eq!(bind.as_deref(), Some("0.0.0.0:8080"));
            }
            Command::Analyze(_) => panic!("expected serve"),
        }
    }
}
