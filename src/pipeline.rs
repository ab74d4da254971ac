//! Orchestrates fetch, framework analysis, insight synthesis and reporting.
//!
//! A failed content fetch aborts the request because there is nothing to
//! analyse. Every later step is partial: its failure is recorded as a status
//! tag and the remaining steps still run.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::analysis::FrameworkAnalyzer;
use crate::browser::BrowserSession;
use crate::config::{ApiKeys, AppConfig, PipelineConfig};
use crate::error::{AnalysisError, Result};
use crate::fetcher::{BrowserFetcher, ContentFetcher, HttpFetcher};
use crate::filter::{UrlFilter, UrlFilterConfig, validate_target_url};
use crate::llm::{self, LlmClient};
use crate::prompts::insights_prompt;
use crate::report::{ComprehensiveInputs, ReportBuilder};
use crate::results::{
    Availability, ComprehensiveAnalysisResult, FrameworkKind, FrameworkOutcome, LighthouseScores,
    NOT_REQUESTED, PageAudit, PageSummary, ScrapedContent, StepStatus, TrendsSnapshot,
};
use crate::tools::{
    FirstAvailable, LocalLighthouse, MetricsSource, PageSpeedClient, TrendsProbe, TrendsSource,
};

/// Analysis request as accepted by the API and the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub keyword: Option<String>,
    /// Framework identifiers; the default set when absent or empty
    #[serde(default)]
    pub frameworks: Option<Vec<String>>,
    #[serde(default)]
    pub include_lighthouse: bool,
    #[serde(default)]
    pub include_page_audit: bool,
    #[serde(default)]
    pub include_all_pages: bool,
    #[serde(default)]
    pub render_js: bool,
}

/// A request whose inputs have been checked
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub url: Url,
    pub keyword: Option<String>,
    pub frameworks: Vec<FrameworkKind>,
    pub include_lighthouse: bool,
    pub include_page_audit: bool,
    pub include_all_pages: bool,
    pub render_js: bool,
}

impl AnalysisRequest {
    pub fn for_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Checks every input. Runs before any network call.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let url = validate_target_url(&self.url)?;
        let frameworks = parse_frameworks(self.frameworks.as_deref())?;
        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(ValidatedRequest {
            url,
            keyword,
            frameworks,
            include_lighthouse: self.include_lighthouse,
            include_page_audit: self.include_page_audit,
            include_all_pages: self.include_all_pages,
            render_js: self.render_js,
        })
    }
}

/// Parses framework identifiers, falling back to the default set
pub fn parse_frameworks(names: Option<&[String]>) -> Result<Vec<FrameworkKind>> {
    match names {
        None | Some([]) => Ok(FrameworkKind::DEFAULT.to_vec()),
        Some(names) => names.iter().map(|n| n.parse()).collect(),
    }
}

/// Output of phase 1: page content plus optional performance and page data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase1Result {
    pub url: String,
    pub content: ScrapedContent,
    pub lighthouse: Availability<LighthouseScores>,
    #[serde(default)]
    pub pages: Vec<PageAudit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    fn new(name: &str, status: StepStatus, started: Instant, error: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            duration_ms: started.elapsed().as_millis() as u64,
            error,
        }
    }

    fn skipped(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Skipped,
            duration_ms: 0,
            error: Some(reason.to_string()),
        }
    }

    fn from_availability<T>(name: &str, started: Instant, value: &Availability<T>) -> Self {
        match value.reason() {
            None => Self::new(name, StepStatus::Succeeded, started, None),
            Some(NOT_REQUESTED) => Self::skipped(name, NOT_REQUESTED),
            Some(reason) => Self::new(name, StepStatus::Failed, started, Some(reason.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepByStepResult {
    pub steps: Vec<StepRecord>,
    /// Absent when the run stopped early
    pub result: Option<ComprehensiveAnalysisResult>,
}

impl StepByStepResult {
    /// First failed step that stopped the run
    pub fn fatal_error(&self) -> Option<&str> {
        if self.result.is_some() {
            return None;
        }
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Failed)
            .and_then(|s| s.error.as_deref())
    }
}

pub struct Pipeline {
    fetcher: Arc<dyn ContentFetcher>,
    browser_fetcher: Option<Arc<dyn ContentFetcher>>,
    analyzer: FrameworkAnalyzer,
    metrics: Option<Arc<dyn MetricsSource>>,
    trends: Option<Arc<dyn TrendsSource>>,
    llm: Arc<dyn LlmClient>,
    browser: Option<Arc<BrowserSession>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        llm: Arc<dyn LlmClient>,
        config: PipelineConfig,
        max_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            browser_fetcher: None,
            analyzer: FrameworkAnalyzer::new(llm.clone(), max_chars),
            metrics: None,
            trends: None,
            llm,
            browser: None,
            config,
        }
    }

    pub fn with_browser_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.browser_fetcher = Some(fetcher);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSource>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_trends(mut self, trends: Arc<dyn TrendsSource>) -> Self {
        self.trends = Some(trends);
        self
    }

    /// Wires the production collaborators from configuration.
    ///
    /// With `connect_browser`, a WebDriver session is opened for rendered
    /// fetches and trends; if none is reachable the pipeline runs without it.
    pub async fn from_config(config: &AppConfig, keys: &ApiKeys, connect_browser: bool) -> Result<Self> {
        let http = llm::http_client(config.llm.timeout_secs)?;
        let model = llm::build_client(&config.llm, keys, http.clone());
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);

        let mut pagespeed = PageSpeedClient::new(
            http,
            keys.google.clone(),
            &config.tools.pagespeed_strategy,
        );
        if let Some(base) = &config.tools.pagespeed_base_url {
            pagespeed = pagespeed.with_endpoint(&format!(
                "{}/pagespeedonline/v5/runPagespeed",
                base.trim_end_matches('/')
            ));
        }
        let mut sources: Vec<Arc<dyn MetricsSource>> = vec![Arc::new(pagespeed)];
        if config.tools.lighthouse_command.is_some() {
            sources.push(Arc::new(LocalLighthouse::from_config(&config.tools)));
        }

        let mut pipeline = Self::new(fetcher, model, config.pipeline.clone(), config.fetch.max_chars)
            .with_metrics(Arc::new(FirstAvailable::new(sources)));

        if connect_browser {
            match BrowserSession::connect(&config.webdriver.url).await {
                Ok(session) => {
                    ::log::info!("Using WebDriver at {}", session.endpoint());
                    let session = Arc::new(session.with_navigation_timeout(Duration::from_secs(
                        config.webdriver.navigation_timeout_secs,
                    )));
                    pipeline = pipeline
                        .with_browser_fetcher(Arc::new(BrowserFetcher::new(
                            session.clone(),
                            config.fetch.max_chars,
                        )))
                        .with_trends(Arc::new(TrendsProbe::new(session.clone())));
                    pipeline.browser = Some(session);
                }
                Err(e) => ::log::warn!("Continuing without a browser: {}", e),
            }
        }

        Ok(pipeline)
    }

    /// Ends the WebDriver session if this pipeline holds the last handle
    pub async fn shutdown(mut self) {
        let Some(session) = self.browser.take() else {
            return;
        };
        self.browser_fetcher = None;
        self.trends = None;
        match Arc::try_unwrap(session) {
            Ok(session) => {
                if let Err(e) = session.close().await {
                    ::log::warn!("Failed to close browser session: {}", e);
                }
            }
            Err(_) => ::log::warn!("Browser session still in use, leaving it open"),
        }
    }

    pub fn has_browser(&self) -> bool {
        self.browser_fetcher.is_some()
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.deadline_secs)
    }

    async fn within_deadline<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.deadline(), work)
            .await
            .map_err(|_| AnalysisError::Timeout {
                operation: "analysis".to_string(),
                seconds: self.config.deadline_secs,
            })?
    }

    fn fetcher_for(&self, render_js: bool) -> Result<&Arc<dyn ContentFetcher>> {
        if !render_js {
            return Ok(&self.fetcher);
        }
        self.browser_fetcher.as_ref().ok_or_else(|| {
            AnalysisError::Fetch("JavaScript rendering requested but no browser is available".to_string())
        })
    }

    async fn fetch_content(&self, request: &ValidatedRequest) -> Result<ScrapedContent> {
        self.fetcher_for(request.render_js)?.fetch(&request.url).await
    }

    async fn lighthouse(&self, url: &Url, requested: bool) -> Availability<LighthouseScores> {
        if !requested {
            return Availability::unavailable(NOT_REQUESTED);
        }
        match &self.metrics {
            Some(metrics) => metrics.lighthouse(url.as_str()).await,
            None => Availability::unavailable("no metrics source configured"),
        }
    }

    async fn audit_pages(
        &self,
        request: &ValidatedRequest,
        content: &ScrapedContent,
    ) -> Vec<PageAudit> {
        if !request.include_page_audit && !request.include_all_pages {
            return Vec::new();
        }

        let mut pages = vec![PageAudit {
            url: request.url.to_string(),
            summary: Availability::available(PageSummary::from(content)),
        }];
        if !request.include_all_pages {
            return pages;
        }

        let filter = match UrlFilter::new(UrlFilterConfig::same_site(&request.url)) {
            Ok(filter) => filter,
            Err(e) => {
                ::log::error!("Invalid same-site filter: {}", e);
                return pages;
            }
        };
        let discovered = filter.discover_pages(&request.url, &content.links, self.config.max_pages);
        ::log::info!("Auditing {} additional pages of {}", discovered.len(), request.url);

        let fetcher = &self.fetcher;
        let audits = join_all(discovered.into_iter().map(|page| async move {
            let summary = match fetcher.fetch(&page).await {
                Ok(content) => Availability::available(PageSummary::from(&content)),
                Err(e) => {
                    ::log::warn!("Page audit of {} failed: {}", page, e);
                    Availability::unavailable(e.to_string())
                }
            };
            PageAudit {
                url: page.to_string(),
                summary,
            }
        }))
        .await;
        pages.extend(audits);
        pages
    }

    /// Fetches content, then gathers lighthouse scores and page audits
    pub async fn phase1(&self, request: &ValidatedRequest) -> Result<Phase1Result> {
        let content = self.fetch_content(request).await?;
        let (lighthouse, pages) = tokio::join!(
            self.lighthouse(&request.url, request.include_lighthouse),
            self.audit_pages(request, &content)
        );
        Ok(Phase1Result {
            url: request.url.to_string(),
            content,
            lighthouse,
            pages,
        })
    }

    /// Runs the framework analyses
    pub async fn phase2(
        &self,
        phase1: &Phase1Result,
        frameworks: &[FrameworkKind],
        keyword: Option<&str>,
    ) -> Vec<FrameworkOutcome> {
        self.analyzer
            .analyze_all(frameworks, &phase1.content, keyword)
            .await
    }

    /// Synthesises strategic insights from the framework results
    pub async fn phase3(&self, phase1: &Phase1Result, phase2: &[FrameworkOutcome]) -> Availability<Value> {
        if !phase2.iter().any(FrameworkOutcome::succeeded) {
            return Availability::unavailable("no framework results to synthesise");
        }
        let prompt = insights_prompt(&phase1.content, phase2);
        match self.llm.generate_json(&prompt.text, &prompt.schema_hint).await {
            Ok(insights) => Availability::available(insights),
            Err(e) => {
                ::log::warn!("Insight synthesis failed: {}", e);
                Availability::unavailable(e.to_string())
            }
        }
    }

    async fn trends(&self, keyword: Option<&str>) -> Availability<TrendsSnapshot> {
        let Some(keyword) = keyword else {
            return Availability::unavailable(NOT_REQUESTED);
        };
        match &self.trends {
            Some(trends) => trends.interest(keyword).await,
            None => Availability::unavailable("no browser available for trends lookup"),
        }
    }

    fn assemble(
        request: &ValidatedRequest,
        phase1: Phase1Result,
        frameworks: Vec<FrameworkOutcome>,
        trends: Availability<TrendsSnapshot>,
        insights: Availability<Value>,
    ) -> ComprehensiveAnalysisResult {
        let report = ReportBuilder::build(&ComprehensiveInputs {
            url: &phase1.url,
            content: &phase1.content,
            frameworks: &frameworks,
            lighthouse: &phase1.lighthouse,
            trends: &trends,
            pages: &phase1.pages,
            insights: &insights,
        });
        ComprehensiveAnalysisResult {
            url: phase1.url,
            keyword: request.keyword.clone(),
            content: phase1.content,
            frameworks,
            lighthouse: phase1.lighthouse,
            trends,
            pages: phase1.pages,
            insights,
            report,
            generated_at: Utc::now(),
        }
    }

    async fn run_comprehensive(&self, request: &ValidatedRequest) -> Result<ComprehensiveAnalysisResult> {
        let phase1 = self.phase1(request).await?;
        let keyword = request.keyword.as_deref();
        let (frameworks, trends) = tokio::join!(
            self.phase2(&phase1, &request.frameworks, keyword),
            self.trends(keyword)
        );
        let insights = self.phase3(&phase1, &frameworks).await;
        Ok(Self::assemble(request, phase1, frameworks, trends, insights))
    }

    /// Full analysis, bounded by the pipeline deadline
    pub async fn comprehensive(&self, request: &AnalysisRequest) -> Result<ComprehensiveAnalysisResult> {
        let request = request.validate()?;
        let started = Instant::now();
        ::log::info!("Starting comprehensive analysis of {}", request.url);

        let result = self.within_deadline(self.run_comprehensive(&request)).await;
        match &result {
            Ok(done) => ::log::info!(
                "Analysis of {} finished in {:.1}s with score {:?}",
                request.url,
                started.elapsed().as_secs_f64(),
                done.report.overall_score
            ),
            Err(e) => ::log::error!("Analysis of {} failed: {}", request.url, e),
        }
        result
    }

    async fn run_steps(&self, request: &ValidatedRequest) -> StepByStepResult {
        let mut steps = Vec::new();
        let keyword = request.keyword.as_deref();

        let started = Instant::now();
        let content = match self.fetch_content(request).await {
            Ok(content) => {
                steps.push(StepRecord::new("fetch-content", StepStatus::Succeeded, started, None));
                content
            }
            Err(e) => {
                steps.push(StepRecord::new(
                    "fetch-content",
                    StepStatus::Failed,
                    started,
                    Some(e.to_string()),
                ));
                for name in ["lighthouse", "page-audit", "frameworks", "trends", "insights", "report"] {
                    steps.push(StepRecord::skipped(name, "content fetch failed"));
                }
                return StepByStepResult { steps, result: None };
            }
        };

        let started = Instant::now();
        let lighthouse = self.lighthouse(&request.url, request.include_lighthouse).await;
        steps.push(StepRecord::from_availability("lighthouse", started, &lighthouse));

        let started = Instant::now();
        let pages = self.audit_pages(request, &content).await;
        if pages.is_empty() {
            steps.push(StepRecord::skipped("page-audit", NOT_REQUESTED));
        } else {
            let failed = pages.iter().filter(|p| !p.summary.is_available()).count();
            let (status, error) = if failed == 0 {
                (StepStatus::Succeeded, None)
            } else {
                (StepStatus::Failed, Some(format!("{} of {} pages failed", failed, pages.len())))
            };
            steps.push(StepRecord::new("page-audit", status, started, error));
        }

        let phase1 = Phase1Result {
            url: request.url.to_string(),
            content,
            lighthouse,
            pages,
        };

        let started = Instant::now();
        let frameworks = self.phase2(&phase1, &request.frameworks, keyword).await;
        for outcome in &frameworks {
            steps.push(StepRecord {
                name: format!("framework:{}", outcome.framework),
                status: outcome.status,
                duration_ms: outcome.duration_ms,
                error: outcome.error.clone(),
            });
        }
        let failed = frameworks.iter().filter(|o| !o.succeeded()).count();
        steps.push(StepRecord::new(
            "frameworks",
            if failed == 0 { StepStatus::Succeeded } else { StepStatus::Failed },
            started,
            (failed > 0).then(|| format!("{} of {} frameworks failed", failed, frameworks.len())),
        ));

        let started = Instant::now();
        let trends = self.trends(keyword).await;
        steps.push(StepRecord::from_availability("trends", started, &trends));

        let started = Instant::now();
        let insights = self.phase3(&phase1, &frameworks).await;
        steps.push(StepRecord::from_availability("insights", started, &insights));

        let started = Instant::now();
        let result = Self::assemble(request, phase1, frameworks, trends, insights);
        steps.push(StepRecord::new("report", StepStatus::Succeeded, started, None));

        StepByStepResult {
            steps,
            result: Some(result),
        }
    }

    /// Runs the analysis one step at a time, recording each step's outcome
    pub async fn step_by_step(&self, request: &AnalysisRequest) -> Result<StepByStepResult> {
        let request = request.validate()?;
        ::log::info!("Starting step-by-step analysis of {}", request.url);
        self.within_deadline(async { Ok(self.run_steps(&request).await) })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockLlm, MockMetrics, sample_content};

    const ROOT: &str = "https://acme.test/";

    const GOLDEN: &str = r#"{"why": {"statement": "Calm teams", "score": 82}, "how": {"score": 64}, "what": {"score": 71}, "who": {"score": 58}, "overallScore": 69,
        "recommendations": [{"title": "Lead with the why", "priority": "High", "impact": "High"}]}"#;
    const ELEMENTS: &str = r#"{"elements": [{"name": "Saves time", "present": true, "score": 8}, {"name": "Cost reduction", "present": true, "score": 8}], "overallScore": 40}"#;
    const CLIFTON: &str = r#"{"topThemes": [{"name": "Achiever", "score": 80}], "domainScores": {"Executing": 80}, "overallScore": 75}"#;
    const INSIGHTS: &str = r#"{"strategicSummary": "Acme sells calm.", "keyInsights": ["Calm is the brand"], "recommendations": [{"title": "Own the calm category", "priority": "Medium"}]}"#;

    fn model() -> MockLlm {
        MockLlm::replying("mock", GOLDEN)
            .replying_when("chief marketing strategist", INSIGHTS)
            .replying_when("Elements of Value", ELEMENTS)
            .replying_when("CliftonStrengths framework", CLIFTON)
    }

    fn pipeline(fetcher: Arc<MockFetcher>, llm: Arc<MockLlm>) -> Pipeline {
        Pipeline::new(fetcher, llm, PipelineConfig::default(), 8000)
    }

    #[tokio::test]
    async fn test_comprehensive_runs_every_phase() {
        let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
        let llm = Arc::new(model());
        let result = pipeline(fetcher.clone(), llm.clone())
            .comprehensive(&AnalysisRequest {
                keyword: Some("calm widgets".to_string()),
                ..AnalysisRequest::for_url(ROOT)
            })
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(llm.calls(), 5);
        assert_eq!(result.frameworks.len(), 4);
        assert!(result.frameworks.iter().all(FrameworkOutcome::succeeded));
        assert_eq!(result.keyword.as_deref(), Some("calm widgets"));
        assert_eq!(result.lighthouse.reason(), Some(NOT_REQUESTED));
        assert!(result.pages.is_empty());
        assert_eq!(
            result.insights.value().unwrap()["strategicSummary"],
            "Acme sells calm."
        );
        // golden 69, b2c 40, b2b 40, clifton 75
        assert_eq!(result.report.overall_score, Some(56));
        assert!(result.report.executive_summary.contains("Acme sells calm."));
        assert!(result
            .report
            .recommendations
            .iter()
            .any(|r| r.title == "Own the calm category" && r.source == "insights"));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
        let llm = Arc::new(model());
        let pipeline = pipeline(fetcher.clone(), llm.clone());

        let err = pipeline
            .comprehensive(&AnalysisRequest::for_url("not a url"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_URL");

        let err = pipeline
            .step_by_step(&AnalysisRequest {
                frameworks: Some(vec!["swot".to_string()]),
                ..AnalysisRequest::for_url(ROOT)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_FRAMEWORK");

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() {
        let fetcher = Arc::new(MockFetcher::failing());
        let llm = Arc::new(model());
        let err = pipeline(fetcher, llm.clone())
            .comprehensive(&AnalysisRequest::for_url(ROOT))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SCRAPE_FAILED");
        assert!(err.to_string().starts_with("Failed to scrape website content"));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_render_js_without_browser_is_fetch_error() {
        let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
        let err = pipeline(fetcher.clone(), Arc::new(model()))
            .comprehensive(&AnalysisRequest {
                render_js: true,
                ..AnalysisRequest::for_url(ROOT)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SCRAPE_FAILED");
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_framework_failure_is_partial() {
        let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
        let llm = Arc::new(
            MockLlm::replying("mock", GOLDEN)
                .replying_when("chief marketing strategist", INSIGHTS)
                .failing_when("Elements of Value", "quota exceeded"),
        );
        let result = pipeline(fetcher, llm)
            .comprehensive(&AnalysisRequest {
                frameworks: Some(vec!["golden-circle".to_string(), "b2b_elements".to_string()]),
                ..AnalysisRequest::for_url(ROOT)
            })
            .await
            .unwrap();

        assert_eq!(result.frameworks.len(), 2);
        assert!(result.frameworks[0].succeeded());
        assert_eq!(result.frameworks[1].status, StepStatus::Failed);
        assert!(result.insights.is_available());
        assert!(result.report.executive_summary.contains("(failed: B2B Elements of Value)"));
    }

    #[tokio::test]
    async fn test_lighthouse_and_all_pages() {
        let fetcher = Arc::new(
            MockFetcher::failing()
                .with_page(ROOT, sample_content(ROOT))
                .with_page("https://acme.test/pricing", sample_content("https://acme.test/pricing")),
        );
        let scores = LighthouseScores {
            performance: 91,
            accessibility: 88,
            best_practices: 92,
            seo: 97,
        };
        let metrics = Arc::new(MockMetrics::available("mock", scores));
        let pipeline = pipeline(fetcher.clone(), Arc::new(model())).with_metrics(metrics.clone());

        let request = AnalysisRequest {
            include_lighthouse: true,
            include_all_pages: true,
            ..AnalysisRequest::for_url(ROOT)
        };
        let phase1 = pipeline.phase1(&request.validate().unwrap()).await.unwrap();

        assert_eq!(metrics.calls(), 1);
        assert_eq!(phase1.lighthouse.value(), Some(&scores));
        let urls: Vec<&str> = phase1.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec![ROOT, "https://acme.test/pricing", "https://acme.test/about"]);
        assert!(phase1.pages[1].summary.is_available());
        assert!(!phase1.pages[2].summary.is_available());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_phase3_without_results_is_unavailable() {
        let llm = Arc::new(model());
        let pipeline = pipeline(Arc::new(MockFetcher::failing()), llm.clone());
        let phase1 = Phase1Result {
            url: ROOT.to_string(),
            content: sample_content(ROOT),
            lighthouse: Availability::unavailable(NOT_REQUESTED),
            pages: Vec::new(),
        };
        let insights = pipeline.phase3(&phase1, &[]).await;
        assert!(!insights.is_available());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_deadline_bounds_the_run() {
        let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
        let llm = Arc::new(model().with_delay(Duration::from_secs(5)));
        let pipeline = Pipeline::new(
            fetcher,
            llm,
            PipelineConfig {
                deadline_secs: 1,
                ..PipelineConfig::default()
            },
            8000,
        );
        let err = pipeline
            .comprehensive(&AnalysisRequest::for_url(ROOT))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TIMEOUT");
    }

    #[tokio::test]
    async fn test_step_by_step_records_steps() {
        let fetcher = Arc::new(MockFetcher::returning(sample_content(ROOT)));
        let outcome = pipeline(fetcher, Arc::new(model()))
            .step_by_step(&AnalysisRequest {
                frameworks: Some(vec!["golden-circle".to_string()]),
                include_page_audit: true,
                ..AnalysisRequest::for_url(ROOT)
            })
            .await
            .unwrap();

        let steps: Vec<(&str, StepStatus)> = outcome
            .steps
            .iter()
            .map(|s| (s.name.as_str(), s.status))
            .collect();
        assert_eq!(
            steps,
            vec![
                ("fetch-content", StepStatus::Succeeded),
                ("lighthouse", StepStatus::Skipped),
                ("page-audit", StepStatus::Succeeded),
                ("framework:golden-circle", StepStatus::Succeeded),
                ("frameworks", StepStatus::Succeeded),
                ("trends", StepStatus::Skipped),
                ("insights", StepStatus::Succeeded),
                ("report", StepStatus::Succeeded),
            ]
        );
        assert!(outcome.result.is_some());
        assert_eq!(outcome.fatal_error(), None);
    }

    #[tokio::test]
    async fn test_step_by_step_stops_after_failed_fetch() {
        let outcome = pipeline(Arc::new(MockFetcher::failing()), Arc::new(model()))
            .step_by_step(&AnalysisRequest::for_url(ROOT))
            .await
            .unwrap();
        assert!(outcome.result.is_none());
        assert_eq!(outcome.steps[0].status, StepStatus::Failed);
        assert!(outcome.steps[1..].iter().all(|s| s.status == StepStatus::Skipped));
        assert!(outcome.fatal_error().unwrap().contains("404"));
    }

    #[test]
    fn test_parse_frameworks_defaults() {
        assert_eq!(parse_frameworks(None).unwrap(), FrameworkKind::DEFAULT.to_vec());
        assert_eq!(parse_frameworks(Some(&[])).unwrap(), FrameworkKind::DEFAULT.to_vec());
        assert_eq!(
            parse_frameworks(Some(&["revenue-trends".to_string()])).unwrap(),
            vec![FrameworkKind::RevenueTrends]
        );
    }

    #[test]
    fn test_phase1_result_round_trips_through_api_json() {
        let json = serde_json::json!({
            "url": ROOT,
            "content": sample_content(ROOT),
            "lighthouse": {"status": "unavailable", "reason": "not requested"}
        });
        let phase1: Phase1Result = serde_json::from_value(json).unwrap();
        assert!(phase1.pages.is_empty());
        assert_eq!(phase1.content.title.as_deref(), Some("Acme Widgets"));
    }
}
