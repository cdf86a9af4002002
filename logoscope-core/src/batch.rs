use crate::error::Result;
use crate::extract::Pipeline;
use crate::report::LogoReport;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Options for a batch run
pub struct BatchOptions {
    pub concurrency: usize,
    pub show_progress_bars: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            show_progress_bars: false,
        }
    }
}

/// Prefix bare hosts with `https://`.
pub fn normalize_target(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// One URL per line. Blank lines and `#` comments are skipped.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_target)
        .collect())
}

/// Extract every URL with at most `concurrency` pages in flight.
///
/// Reports arrive in completion order. A failing URL only affects its own
/// report.
pub async fn run_batch(pipeline: &Pipeline, urls: Vec<String>, options: BatchOptions) -> Vec<LogoReport> {
    let total = urls.len();
    let concurrency = options.concurrency.max(1);

    // Set up a single spinner for overall progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Extracting logos from {} site(s)...", total));
        Some(Arc::new(pb))
    } else {
        None
    };

    let done = AtomicUsize::new(0);
    info!("Batch of {} URL(s), concurrency {}", total, concurrency);

    let reports: Vec<LogoReport> = stream::iter(urls)
        .map(|url| {
            let progress_bar = progress_bar.clone();
            let done = &done;
            async move {
                let report = pipeline.extract_site(&url).await;
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(pb) = progress_bar {
                    pb.set_message(format!("[{}/{}] {}", n, total, url));
                    pb.tick();
                }
                report
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    if let Some(ref pb) = progress_bar {
        let found = reports.iter().filter(|r| r.found_logo()).count();
        pb.finish_with_message(format!("Done! {}/{} logos found", found, total));
    }

    reports
}
