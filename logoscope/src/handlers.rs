use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use logoscope_core::batch::{self, BatchOptions};
use logoscope_core::report::{self, ReportFormat};
use logoscope_core::{ExtractOptions, LogoReport, PaletteExtractor, Pipeline};
use logoscope_scanner::{HttpRenderer, KeywordTables, urls};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

// Helper functions for the extract handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(url: Option<&Url>, hosts_file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(path) = hosts_file {
        let urls = batch::load_urls_from_file(path)
            .with_context(|| format!("Failed to read hosts file {}", path.display()))?;
        if urls.is_empty() {
            bail!("No URLs found in {}", path.display());
        }
        Ok(urls)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        bail!("Either --url or --hosts-file must be provided")
    }
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(raw).map_or_else(|_| raw.to_string(), |p| p.into_owned()))
}

/// Site name for a hostname or full URL
pub fn site_name_for(input: &str) -> String {
    let host = if input.contains("://") {
        urls::domain_of(input)
    } else {
        input.split('/').next().unwrap_or_default().to_lowercase()
    };
    urls::site_name_of(&host, &KeywordTables::default())
}

pub fn print_banner() {
    println!(
        "{} {}",
        "logoscope".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Console rendering of one report
pub fn format_report(report: &LogoReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(report::generate_json_report(report)?),
        ReportFormat::Text => Ok(report::render_text(report)),
    }
}

fn print_summary(reports: &[LogoReport]) {
    let found = reports.iter().filter(|r| r.found_logo()).count();
    let fallbacks = reports.iter().filter(|r| r.used_favicon_fallback).count();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();

    print_divider();
    println!(
        "{} {} / {} sites",
        "Logos found:".bold(),
        found.to_string().green(),
        reports.len()
    );
    if fallbacks > 0 {
        println!("  {} used the favicon fallback", fallbacks.to_string().yellow());
    }
    if failed > 0 {
        println!("  {} failed to load", failed.to_string().red());
    }
}

pub async fn handle_extract(args: &ArgMatches, quiet: bool) -> Result<()> {
    let url = args.get_one::<Url>("url");
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    let threads = *args.get_one::<usize>("threads").unwrap_or(&4);
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&15);
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output_dir = args.get_one::<String>("output").map(|p| expand_path(p));
    let save_inline = args.get_one::<String>("save-inline").map(|p| expand_path(p));

    let targets = load_urls_from_source(url, hosts_file)?;
    debug!("Loaded {} target(s)", targets.len());

    let options = ExtractOptions {
        include_candidates: args.get_flag("candidates"),
        persist_dir: save_inline,
        extract_colors: args.get_flag("colors"),
    };

    let mut renderer = HttpRenderer::with_timeout(timeout);
    if let Some(agent) = args.get_one::<String>("user-agent") {
        renderer = renderer.with_user_agent(agent);
    }
    let mut pipeline = Pipeline::new(Arc::new(renderer)).with_options(options);
    if args.get_flag("colors") {
        pipeline = pipeline.with_colors(Arc::new(PaletteExtractor::new()));
    }

    let batch_options = BatchOptions {
        concurrency: threads,
        show_progress_bars: !quiet && targets.len() > 1,
    };
    let reports = batch::run_batch(&pipeline, targets, batch_options).await;

    for report in &reports {
        println!("{}", format_report(report, format)?);
    }

    if let Some(ref dir) = output_dir {
        write_output(&reports, dir)?;
    }

    if !quiet && reports.len() > 1 {
        print_summary(&reports);
    }

    if reports.iter().all(|r| r.error.is_some()) {
        bail!("No site could be loaded");
    }
    Ok(())
}

fn write_output(reports: &[LogoReport], dir: &Path) -> Result<()> {
    let paths = report::write_reports(reports, dir)
        .with_context(|| format!("Failed to write reports to {}", dir.display()))?;
    for path in paths {
        println!("{} {}", "Saved".green(), path.display());
    }
    Ok(())
}

pub fn handle_site_name(args: &ArgMatches) -> Result<()> {
    let input = args
        .get_one::<String>("HOST")
        .context("HOST is required")?;
    let name = site_name_for(input);
    if name.is_empty() {
        bail!("Could not derive a site name from {:?}", input);
    }
    println!("{}", name);
    Ok(())
}
