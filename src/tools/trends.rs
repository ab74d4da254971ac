use async_trait::async_trait;
use fantoccini::Locator;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::browser::BrowserSession;
use crate::error::{AnalysisError, Result};
use crate::results::{Availability, TrendsSnapshot};
use crate::tools::TrendsSource;

const EXPLORE_URL: &str = "https://trends.google.com/trends/explore";

/// Cells of the accessible data table behind the interest-over-time chart
const INTEREST_SELECTOR: &str = "line-chart-directive table tbody tr td:last-child";
const RELATED_SELECTOR: &str = "related-queries .label-text";

/// Reads search interest from the Google Trends explore page
pub struct TrendsProbe {
    session: Arc<BrowserSession>,
    render_wait: Duration,
}

impl TrendsProbe {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self {
            session,
            render_wait: Duration::from_secs(15),
        }
    }

    fn explore_url(keyword: &str) -> Result<Url> {
        Url::parse_with_params(EXPLORE_URL, &[("q", keyword), ("date", "today 12-m")])
            .map_err(|e| AnalysisError::Config(format!("trends url: {}", e)))
    }

    async fn read(&self, keyword: &str) -> Result<(Vec<String>, Vec<String>)> {
        let url = Self::explore_url(keyword)?;
        let wait = self.render_wait;
        self.session
            .with_page(url.as_str(), |client| async move {
                // Charts render client-side; a missing chart is reported below
                let _ = client
                    .wait()
                    .at_most(wait)
                    .for_element(Locator::Css(INTEREST_SELECTOR))
                    .await;

                let mut cells = Vec::new();
                for element in client.find_all(Locator::Css(INTEREST_SELECTOR)).await.map_err(
                    |e| AnalysisError::Browser(format!("querying trends chart: {}", e)),
                )? {
                    if let Ok(text) = element.text().await {
                        cells.push(text);
                    }
                }

                let mut related = Vec::new();
                if let Ok(elements) = client.find_all(Locator::Css(RELATED_SELECTOR)).await {
                    for element in elements {
                        if let Ok(text) = element.text().await {
                            related.push(text);
                        }
                    }
                }
                Ok::<_, AnalysisError>((cells, related))
            })
            .await
    }

    pub async fn interest(&self, keyword: &str) -> Availability<TrendsSnapshot> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Availability::unavailable("no keyword supplied");
        }

        match self.read(keyword).await {
            Ok((cells, related)) => snapshot_from_nodes(keyword, &cells, &related),
            Err(e) => {
                ::log::warn!("Trends lookup for '{}' failed: {}", keyword, e);
                Availability::unavailable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl TrendsSource for TrendsProbe {
    async fn interest(&self, keyword: &str) -> Availability<TrendsSnapshot> {
        TrendsProbe::interest(self, keyword).await
    }
}

/// Builds a snapshot from the text of the chart cells. No parseable cells
/// means no data.
pub fn snapshot_from_nodes(
    keyword: &str,
    cells: &[String],
    related: &[String],
) -> Availability<TrendsSnapshot> {
    let interest_over_time: Vec<u32> = cells
        .iter()
        .filter_map(|cell| cell.trim().trim_end_matches('%').replace("<1", "0").parse().ok())
        .collect();

    if interest_over_time.is_empty() {
        ::log::info!("No trends data nodes found for '{}'", keyword);
        return Availability::unavailable("no interest-over-time data found on the trends page");
    }

    let related_queries = related
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect();

    Availability::available(TrendsSnapshot {
        keyword: keyword.to_string(),
        interest_over_time,
        related_queries,
    })
}
