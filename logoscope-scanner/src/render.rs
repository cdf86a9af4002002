use crate::error::{Result, ScanError};
use crate::page::{PageSnapshot, Viewport};
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Turns a URL into a queryable page snapshot.
///
/// Browser-backed implementations run their evaluation script and return the
/// resulting element table; [`HttpRenderer`] parses the static response.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<PageSnapshot>;
}

/// Navigation wait conditions, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTier {
    NetworkIdle,
    Load,
    DomContentLoaded,
}

impl WaitTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitTier::NetworkIdle => "networkidle",
            WaitTier::Load => "load",
            WaitTier::DomContentLoaded => "domcontentloaded",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TierConfig {
    pub tier: WaitTier,
    /// Pause before this tier is attempted.
    pub grace: Duration,
}

pub fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            tier: WaitTier::NetworkIdle,
            grace: Duration::ZERO,
        },
        TierConfig {
            tier: WaitTier::Load,
            grace: Duration::from_millis(1000),
        },
        TierConfig {
            tier: WaitTier::DomContentLoaded,
            grace: Duration::from_millis(2000),
        },
    ]
}

/// Try each tier in order until one navigation succeeds.
///
/// Every tier is attempted, including the loosest, before giving up with
/// [`ScanError::Navigation`].
pub async fn navigate_with_fallback<T, F, Fut>(
    url: &str,
    tiers: &[TierConfig],
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(WaitTier) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = String::from("no wait tiers configured");

    for (n, config) in tiers.iter().enumerate() {
        if !config.grace.is_zero() {
            tokio::time::sleep(config.grace).await;
        }
        debug!("Navigating to {} (wait: {})", url, config.tier.as_str());

        match attempt(config.tier).await {
            Ok(page) => {
                if n > 0 {
                    info!("Navigation to {} succeeded on fallback tier {}", url, config.tier.as_str());
                }
                return Ok(page);
            }
            Err(e) => {
                warn!("Navigation to {} failed (wait: {}): {}", url, config.tier.as_str(), e);
                last_error = e.to_string();
            }
        }
    }

    Err(ScanError::Navigation {
        url: url.to_string(),
        attempts: tiers.len(),
        last_error,
    })
}

/// Static renderer: markup parsed without script execution.
///
/// Every tier is the same GET; a failed fetch is retried after the next
/// tier's grace wait. Wait tiers only change behaviour for browser renderers,
/// which can wait for network idle or the load event.
pub struct HttpRenderer {
    client: Client,
    tiers: Vec<TierConfig>,
    viewport: Viewport,
    timeout_secs: u64,
}

impl HttpRenderer {
    pub fn new() -> Self {
        Self::with_timeout(15)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self::build(timeout_secs, "Mozilla/5.0 (compatible; Logoscope/0.1)")
    }

    fn build(timeout_secs: u64, user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2 + 1))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            tiers: default_tiers(),
            viewport: Viewport::default(),
            timeout_secs,
        }
    }

    pub fn with_user_agent(self, user_agent: &str) -> Self {
        Self {
            tiers: self.tiers,
            viewport: self.viewport,
            ..Self::build(self.timeout_secs, user_agent)
        }
    }

    pub fn with_tiers(mut self, tiers: Vec<TierConfig>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn fetch(&self, url: &str, tier: WaitTier) -> Result<PageSnapshot> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Other(format!("HTTP {} ({})", status.as_u16(), tier.as_str())));
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;

        let mut snapshot = PageSnapshot::from_html(&final_url, &body);
        snapshot.viewport = self.viewport;
        Ok(snapshot)
    }
}

impl Default for HttpRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<PageSnapshot> {
        Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        navigate_with_fallback(url, &self.tiers, |tier| self.fetch(url, tier)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn instant_tiers() -> Vec<TierConfig> {
        default_tiers()
            .into_iter()
            .map(|t| TierConfig {
                grace: Duration::ZERO,
                ..t
            })
            .collect()
    }

    #[tokio::test]
    async fn test_render_parses_html() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body><img src='/logo.png'></body></html>".as_slice()),
            )
            .mount(&mock_server)
            .await;

        let renderer = HttpRenderer::new().with_tiers(instant_tiers());
        let page = renderer.render(&mock_server.uri()).await.unwrap();

        assert!(page.url.starts_with(&mock_server.uri()));
        assert_eq!(page.elements_by_tag("img").count(), 1);
    }

    #[tokio::test]
    async fn test_render_sends_custom_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "AcmeBot/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let renderer = HttpRenderer::with_timeout(5)
            .with_user_agent("AcmeBot/1.0")
            .with_tiers(instant_tiers());
        let page = renderer.render(&mock_server.uri()).await;

        assert!(page.is_ok());
    }

    #[tokio::test]
    async fn test_render_recovers_on_fallback_tier() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body>ok</body></html>".as_slice()),
            )
            .mount(&mock_server)
            .await;

        let renderer = HttpRenderer::new().with_tiers(instant_tiers());
        assert!(renderer.render(&mock_server.uri()).await.is_ok());
    }

    #[tokio::test]
    async fn test_render_fails_after_all_tiers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&mock_server)
            .await;

        let renderer = HttpRenderer::new().with_tiers(instant_tiers());
        let err = renderer.render(&mock_server.uri()).await.unwrap_err();

        match err {
            ScanError::Navigation { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected navigation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_render_rejects_invalid_url() {
        let renderer = HttpRenderer::new();
        let err = renderer.render("not a url").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_waits_grace_between_tiers() {
        let start = tokio::time::Instant::now();
        let result: Result<()> = navigate_with_fallback("https://acme.com", &default_tiers(), |_| async {
            Err(ScanError::Other("timeout".into()))
        })
        .await;

        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }
}
