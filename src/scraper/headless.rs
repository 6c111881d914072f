//! Headless browser render strategy
//!
//! Launches an isolated browser per call, renders the listing, waits a fixed
//! settle delay and extracts the rendered text through the same rule table as
//! the HTTP strategy. The browser process is torn down when `Browser` drops,
//! which happens on every exit path of the blocking render task, and a
//! timed-out render is awaited before the call returns.

use crate::config::ScraperConfig;
use crate::scraper::{PageScraper, RuleTable, ScrapeError, ScrapedPage};
use crate::url::host_of;
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SETTLE_STEP: Duration = Duration::from_millis(100);

/// Headless rendering strategy
pub struct HeadlessScraper {
    settle_delay: Duration,
    render_timeout: Duration,
    chrome_path: Option<PathBuf>,
    rules: Arc<RuleTable>,
}

impl HeadlessScraper {
    pub fn new(config: &ScraperConfig, rules: Arc<RuleTable>) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            render_timeout: Duration::from_secs(config.render_timeout_secs),
            chrome_path: config.chrome_path.as_ref().map(PathBuf::from),
            rules,
        }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, ScrapeError> {
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(true)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(self.render_timeout + self.settle_delay)
            .build()
            .map_err(|e| ScrapeError::Render(e.to_string()))
    }
}

/// Renders a page and returns its HTML
///
/// Runs on a blocking thread; the browser lives only inside this function.
/// Every browser wait is bounded by what is left of `budget`, and `cancelled`
/// is checked between steps so a timed-out render winds down promptly.
fn render_html(
    options: LaunchOptions<'static>,
    url: &str,
    budget: Duration,
    settle_delay: Duration,
    cancelled: &AtomicBool,
) -> anyhow::Result<String> {
    let deadline = Instant::now() + budget;
    let remaining = || deadline.saturating_duration_since(Instant::now());
    let check = || -> anyhow::Result<()> {
        if cancelled.load(Ordering::SeqCst) || remaining().is_zero() {
            anyhow::bail!("render of {} cancelled", url);
        }
        Ok(())
    };

    let browser = Browser::new(options)?;
    let tab = browser.new_tab()?;
    tab.set_default_timeout(remaining());

    tab.navigate_to(url)?.wait_until_navigated()?;
    check()?;
    settle(settle_delay.min(remaining()), cancelled);
    check()?;

    // Any open alert/confirm blocks the page; failure just means none was open
    let _ = tab.call_method(Page::HandleJavaScriptDialog {
        accept: false,
        prompt_text: None,
    });

    tab.set_default_timeout(remaining());
    let html = tab.get_content()?;
    let _ = tab.close(true);
    Ok(html)
}

/// Sleeps for `delay` in short steps, returning early once cancelled
fn settle(delay: Duration, cancelled: &AtomicBool) {
    let until = Instant::now() + delay;
    while !cancelled.load(Ordering::SeqCst) {
        let left = until.saturating_duration_since(Instant::now());
        if left.is_zero() {
            break;
        }
        std::thread::sleep(left.min(SETTLE_STEP));
    }
}

/// Runs a blocking render under `bound`
///
/// On timeout the render is told to stop and awaited, so its browser is gone
/// by the time this returns.
async fn run_bounded<F>(bound: Duration, render: F) -> Result<String, ScrapeError>
where
    F: FnOnce(&AtomicBool) -> anyhow::Result<String> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    let mut task = tokio::task::spawn_blocking(move || render(&flag));

    match tokio::time::timeout(bound, &mut task).await {
        Ok(Ok(Ok(html))) => Ok(html),
        Ok(Ok(Err(e))) => Err(ScrapeError::Render(e.to_string())),
        Ok(Err(join)) => Err(ScrapeError::Render(join.to_string())),
        Err(_) => {
            cancelled.store(true, Ordering::SeqCst);
            if let Err(join) = task.await {
                warn!("Render task failed while stopping: {}", join);
            }
            Err(ScrapeError::Timeout(bound.as_secs()))
        }
    }
}

#[async_trait]
impl PageScraper for HeadlessScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ScrapeError> {
        let host = host_of(url).ok_or_else(|| ScrapeError::InvalidUrl(url.to_string()))?;
        let options = self.launch_options()?;
        let target = url.to_string();
        let bound = self.render_timeout + self.settle_delay;
        let settle_delay = self.settle_delay;

        let html = run_bounded(bound, move |cancelled| {
            render_html(options, &target, bound, settle_delay, cancelled)
        })
        .await?;

        let page = self.rules.extract(&html, &host);
        debug!("Rendered {} ({} characters of text)", url, page.text_len());
        Ok(page)
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_build() {
        let config = ScraperConfig {
            chrome_path: Some("/usr/bin/chromium".to_string()),
            ..ScraperConfig::default()
        };
        let scraper = HeadlessScraper::new(&config, Arc::new(RuleTable::builtin().unwrap()));
        assert!(scraper.launch_options().is_ok());
        assert_eq!(scraper.settle_delay, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_launch() {
        let scraper = HeadlessScraper::new(
            &ScraperConfig::default(),
            Arc::new(RuleTable::builtin().unwrap()),
        );
        let result = scraper.scrape("not a url").await;
        assert!(matches!(result, Err(ScrapeError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_timed_out_render_has_finished_before_returning() {
        let finished = Arc::new(AtomicBool::new(false));
        let done = finished.clone();

        let result = run_bounded(Duration::from_millis(50), move |cancelled| {
            // Stands in for a browser wait that only stops when told to
            while !cancelled.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            done.store(true, Ordering::SeqCst);
            anyhow::bail!("stopped")
        })
        .await;

        assert!(matches!(result, Err(ScrapeError::Timeout(_))));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_render_result_within_bound() {
        let html = run_bounded(Duration::from_secs(5), |_| Ok("<p>ok</p>".to_string()))
            .await
            .unwrap();
        assert_eq!(html, "<p>ok</p>");
    }

    #[test]
    fn test_settle_returns_early_when_cancelled() {
        let cancelled = AtomicBool::new(true);
        let start = Instant::now();
        settle(Duration::from_secs(10), &cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
