// Persisted report shape and writers

use crate::color::BrandColors;
use crate::error::Result;
use crate::extract::LogoExtraction;
use chrono::{DateTime, Utc};
use logoscope_scanner::{ImageCandidate, KeywordTables, urls};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoReport {
    pub source_url: String,
    pub site_name: String,
    /// Always present; `null` when nothing was found
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_score: Option<i32>,
    pub used_favicon_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<BrandColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_error: Option<String>,
    pub extracted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateReport>>,
}

/// Diagnostic view of one ranked candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub rank: usize,
    pub url: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    pub width: u32,
    pub height: u32,
    pub in_header: bool,
    pub in_navigation: bool,
    pub in_homepage_link: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,
}

impl CandidateReport {
    pub fn from_candidate(rank: usize, c: &ImageCandidate) -> Self {
        Self {
            rank,
            url: c.url.clone(),
            source: c.source_kind.as_str().to_string(),
            score: c.score,
            filename: c.filename.clone(),
            alt_text: c.alt_text.clone(),
            css_class: c.css_class.clone(),
            element_id: c.element_id.clone(),
            width: c.width,
            height: c.height,
            in_header: c.is_in_header_region,
            in_navigation: c.is_in_navigation_region,
            in_homepage_link: c.is_in_homepage_anchor,
            byte_size: c.byte_size,
            saved_path: c.saved_path.clone(),
        }
    }
}

impl LogoReport {
    pub fn from_extraction(extraction: &LogoExtraction, include_candidates: bool) -> Self {
        let top = extraction.top.as_ref();
        let candidates = include_candidates.then(|| {
            extraction
                .candidates
                .iter()
                .enumerate()
                .map(|(i, c)| CandidateReport::from_candidate(i + 1, c))
                .collect()
        });

        Self {
            source_url: extraction.source_url.clone(),
            site_name: extraction.site_name.clone(),
            logo_url: top.map(|c| c.url.clone()),
            logo_source: top.map(|c| c.source_kind.as_str().to_string()),
            logo_score: top.and_then(|c| c.score),
            used_favicon_fallback: extraction.used_favicon_fallback,
            colors: None,
            error: None,
            color_error: None,
            extracted_at: Utc::now(),
            candidates,
        }
    }

    /// Report for a URL whose logo extraction failed outright.
    pub fn failed(source_url: &str, error: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            site_name: urls::site_name_of(&urls::domain_of(source_url), &KeywordTables::default()),
            logo_url: None,
            logo_source: None,
            logo_score: None,
            used_favicon_fallback: false,
            colors: None,
            error: Some(error.to_string()),
            color_error: None,
            extracted_at: Utc::now(),
            candidates: None,
        }
    }

    pub fn found_logo(&self) -> bool {
        self.logo_url.is_some()
    }
}

pub fn generate_json_report(report: &LogoReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_report(report: &LogoReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_json_report(report)?)?;
    debug!("Wrote report for {} to {}", report.source_url, path.display());
    Ok(())
}

/// One `<site_name>.json` per report. Clashing names get a numeric suffix.
pub fn write_reports(reports: &[LogoReport], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(reports.len());

    for (i, report) in reports.iter().enumerate() {
        let stem = file_stem(&report.site_name).unwrap_or_else(|| format!("report_{}", i + 1));
        let mut name = stem.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{}_{}", stem, n);
            n += 1;
        }

        let path = dir.join(format!("{}.json", name));
        write_report(report, &path)?;
        written.push(path);
    }

    Ok(written)
}

fn file_stem(site_name: &str) -> Option<String> {
    let stem: String = site_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    (!stem.trim_matches('_').is_empty()).then_some(stem)
}

pub fn render_text(report: &LogoReport) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str(&format!("Site:         {}\n", report.source_url));
    if !report.site_name.is_empty() {
        out.push_str(&format!("Name:         {}\n", report.site_name));
    }

    match report.logo_url {
        Some(ref url) => {
            out.push_str(&format!("Logo:         {}\n", display_url(url)));
            if let Some(ref source) = report.logo_source {
                let score = report.logo_score.map_or("-".to_string(), |s| s.to_string());
                out.push_str(&format!("Source:       {} (score {})\n", source, score));
            }
            if report.used_favicon_fallback {
                out.push_str("              favicon fallback, no logo scored above zero\n");
            }
        }
        None => out.push_str("Logo:         not found\n"),
    }

    if let Some(ref colors) = report.colors {
        out.push_str(&format!("Colors:       {} / {}\n", colors.primary, colors.secondary));
    }
    if let Some(ref error) = report.error {
        out.push_str(&format!("Error:        {}\n", error));
    }
    if let Some(ref error) = report.color_error {
        out.push_str(&format!("Color error:  {}\n", error));
    }

    if let Some(ref candidates) = report.candidates {
        out.push_str(&format!("\n# Candidates ({})\n", candidates.len()));
        for c in candidates {
            let score = c.score.map_or("  -".to_string(), |s| format!("{:>3}", s));
            out.push_str(&format!("  {:>2}. [{}] {:<24} {}\n", c.rank, score, c.source, display_url(&c.url)));
        }
    }

    out
}

/// Inline data URIs are shortened for display.
fn display_url(url: &str) -> String {
    if url.len() > 80 && url.starts_with("data:") {
        let head = url.split_once(',').map_or(url, |(h, _)| h);
        format!("{},… ({} chars)", head, url.len())
    } else {
        url.to_string()
    }
}
