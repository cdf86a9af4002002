use logoscope::command_argument_builder;
use logoscope::handlers::*;
use logoscope_core::LogoReport;
use logoscope_core::report::ReportFormat;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use url::Url;

#[test]
fn test_load_urls_from_single_url() {
    let url = Url::parse("https://acme.com/").unwrap();
    let urls = load_urls_from_source(Some(&url), None).unwrap();
    assert_eq!(urls, vec!["https://acme.com/"]);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://acme.com")?;
    writeln!(temp_file, "globex.com")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "# initech.com")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_source(None, Some(&path))?;

    assert_eq!(urls, vec!["https://acme.com", "https://globex.com"]);
    Ok(())
}

#[test]
fn test_load_urls_from_empty_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = PathBuf::from(temp_file.path());
    assert!(load_urls_from_source(None, Some(&path)).is_err());
}

#[test]
fn test_load_urls_requires_a_source() {
    assert!(load_urls_from_source(None, None).is_err());
}

#[test]
fn test_site_name_for_hosts_and_urls() {
    assert_eq!(site_name_for("www.acme.com"), "acme");
    assert_eq!(site_name_for("invest.debrecen.hu"), "debrecen");
    assert_eq!(site_name_for("https://shop.acme.co.uk/about"), "acme");
    assert_eq!(site_name_for(""), "");
}

#[test]
fn test_expand_path_tilde() {
    let expanded = expand_path("~/logos");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert_eq!(expand_path("/tmp/out"), PathBuf::from("/tmp/out"));
}

#[test]
fn test_format_report_json() {
    let report = LogoReport::failed("https://acme.com/", "boom");
    let json = format_report(&report, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["logo_url"].is_null());
    assert_eq!(value["error"], "boom");
}

// ============================================================================
// Command line parsing
// ============================================================================

#[test]
fn test_extract_command_parses() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "logoscope",
            "extract",
            "-u",
            "https://acme.com",
            "--candidates",
            "-f",
            "json",
        ])
        .unwrap();

    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "extract");
    assert!(sub.get_flag("candidates"));
    assert_eq!(sub.get_one::<String>("format").unwrap(), "json");
    assert_eq!(*sub.get_one::<usize>("threads").unwrap(), 4);
    assert_eq!(*sub.get_one::<u64>("timeout").unwrap(), 15);
}

#[test]
fn test_extract_accepts_user_agent() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "logoscope",
            "extract",
            "-u",
            "https://acme.com",
            "--user-agent",
            "AcmeBot/1.0",
        ])
        .unwrap();

    let (_, sub) = matches.subcommand().unwrap();
    assert_eq!(sub.get_one::<String>("user-agent").unwrap(), "AcmeBot/1.0");
}

#[test]
fn test_extract_requires_a_target() {
    let result = command_argument_builder().try_get_matches_from(["logoscope", "extract"]);
    assert!(result.is_err());
}

#[test]
fn test_url_and_hosts_file_conflict() {
    let result = command_argument_builder().try_get_matches_from([
        "logoscope",
        "extract",
        "-u",
        "https://acme.com",
        "-H",
        "urls.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_site_name_command_parses() {
    let matches = command_argument_builder()
        .try_get_matches_from(["logoscope", "-q", "site-name", "www.acme.com"])
        .unwrap();
    assert!(matches.get_flag("quiet"));
    let (_, sub) = matches.subcommand().unwrap();
    assert_eq!(sub.get_one::<String>("HOST").unwrap(), "www.acme.com");
}
