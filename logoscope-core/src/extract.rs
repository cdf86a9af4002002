use crate::color::{self, BrandColors, ColorExtractor};
use crate::error::{CoreError, Result};
use crate::persist;
use crate::report::LogoReport;
use logoscope_scanner::{
    ImageCandidate, Renderer, SiteContext, favicon_candidate, find_favicon, harvest, rank, select_top,
};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for one extraction
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Keep the full ranked list on the result
    pub include_candidates: bool,
    /// Save inline data-URI images here
    pub persist_dir: Option<PathBuf>,
    pub extract_colors: bool,
}

/// Outcome of a logo extraction for one page
#[derive(Debug, Clone)]
pub struct LogoExtraction {
    pub source_url: String,
    pub site_name: String,
    /// Selected candidate, the favicon fallback included
    pub top: Option<ImageCandidate>,
    pub used_favicon_fallback: bool,
    /// Every candidate in ranked order
    pub candidates: Vec<ImageCandidate>,
}

impl LogoExtraction {
    pub fn logo_url(&self) -> Option<&str> {
        self.top.as_ref().map(|c| c.url.as_str())
    }
}

/// Render, harvest, rank and select, with concurrent color extraction.
pub struct Pipeline {
    renderer: Arc<dyn Renderer>,
    colors: Option<Arc<dyn ColorExtractor>>,
    client: Client,
    options: ExtractOptions,
}

impl Pipeline {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            renderer,
            colors: None,
            client,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_colors(mut self, extractor: Arc<dyn ColorExtractor>) -> Self {
        self.colors = Some(extractor);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Find the logo on `url`.
    ///
    /// Navigation failure is the only error; an empty page still yields the
    /// favicon fallback when one can be located.
    pub async fn extract_logo(&self, url: &str) -> Result<LogoExtraction> {
        info!("Extracting logo from {}", url);
        let page = self.renderer.render(url).await?;

        let context = SiteContext::new(&page.url).with_viewport(page.viewport);
        let mut candidates = harvest(&page, &page.url, &context);

        if let Some(ref dir) = self.options.persist_dir {
            let saved = persist::persist_all(&mut candidates, dir);
            debug!("Saved {} inline image(s) to {}", saved, dir.display());
        }

        let mut ranked = rank(candidates, &context);
        let mut top = select_top(&ranked, &context).cloned();
        let mut used_favicon_fallback = false;

        // Nothing viable: fall back to the favicon
        if top.is_none()
            && let Some(icon_url) = find_favicon(&page, &page.url)
        {
            used_favicon_fallback = true;
            top = match ranked.iter().find(|c| c.url == icon_url) {
                Some(existing) => Some(existing.clone()),
                None => {
                    let fallback = favicon_candidate(&icon_url);
                    ranked.push(fallback.clone());
                    Some(fallback)
                }
            };
        }

        match top {
            Some(ref logo) => info!(
                "Logo for {}: {} (score {}, {})",
                url,
                logo.url,
                logo.score_or_zero(),
                logo.source_kind.as_str()
            ),
            None => info!("No logo found for {}", url),
        }

        Ok(LogoExtraction {
            source_url: url.to_string(),
            site_name: context.site_name,
            top,
            used_favicon_fallback,
            candidates: ranked,
        })
    }

    /// Brand colors from the site's icon, rendered in its own context.
    pub async fn extract_colors(&self, url: &str) -> Result<BrandColors> {
        let extractor = self
            .colors
            .as_ref()
            .ok_or_else(|| CoreError::Color("no color extractor configured".into()))?;

        let page = self.renderer.render(url).await?;
        let icon_url = find_favicon(&page, &page.url)
            .ok_or_else(|| CoreError::Color(format!("no icon for {}", url)))?;
        debug!("Extracting colors from {}", icon_url);

        let bytes = color::fetch_icon(&self.client, &icon_url).await?;
        let pair = extractor.extract(&bytes).await?;
        BrandColors::from_pair(pair)
    }

    /// Logo and colors for one site. Never fails: each half settles on its
    /// own and errors land on the report.
    pub async fn extract_site(&self, url: &str) -> LogoReport {
        let want_colors = self.options.extract_colors && self.colors.is_some();

        let (logo, colors) = tokio::join!(self.extract_logo(url), async {
            if want_colors {
                Some(self.extract_colors(url).await)
            } else {
                None
            }
        });

        let mut report = match logo {
            Ok(extraction) => LogoReport::from_extraction(&extraction, self.options.include_candidates),
            Err(e) => {
                warn!("Logo extraction failed for {}: {}", url, e);
                LogoReport::failed(url, &e.to_string())
            }
        };

        match colors {
            Some(Ok(colors)) => report.colors = Some(colors),
            Some(Err(e)) => {
                warn!("Color extraction failed for {}: {}", url, e);
                report.color_error = Some(e.to_string());
            }
            None => {}
        }

        report
    }
}
