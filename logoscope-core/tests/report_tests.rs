// Tests for report writing

use logoscope_core::LogoReport;
use logoscope_core::report::{render_text, write_report, write_reports};
use std::fs;
use tempfile::TempDir;

fn report(url: &str, logo: Option<&str>) -> LogoReport {
    let mut r = LogoReport::failed(url, "placeholder");
    r.error = None;
    r.logo_url = logo.map(str::to_string);
    r
}

#[test]
fn test_write_report_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/out/acme.json");

    write_report(&report("https://acme.com/", Some("https://acme.com/logo.png")), &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["source_url"], "https://acme.com/");
    assert_eq!(value["logo_url"], "https://acme.com/logo.png");
    assert_eq!(value["used_favicon_fallback"], false);
    assert!(value["extracted_at"].is_string());
}

#[test]
fn test_write_reports_names_files_by_site() {
    let dir = TempDir::new().unwrap();
    let reports = vec![
        report("https://acme.com/", Some("https://acme.com/logo.png")),
        report("https://www.globex.com/", None),
        report("https://shop.acme.com/", None),
    ];

    let paths = write_reports(&reports, dir.path()).unwrap();
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["acme.json", "globex.json", "acme_2.json"]);
    let globex: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&paths[1]).unwrap()).unwrap();
    assert!(globex["logo_url"].is_null());
}

#[test]
fn test_write_reports_without_site_name() {
    let dir = TempDir::new().unwrap();
    let paths = write_reports(&[report("not a url", None)], dir.path()).unwrap();
    assert!(paths[0].ends_with("report_1.json"));
}

#[test]
fn test_render_text_not_found() {
    let text = render_text(&report("https://acme.com/", None));
    assert!(text.contains("not found"));
}
