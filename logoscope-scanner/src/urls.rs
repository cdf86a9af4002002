// URL and site-identity helpers. Everything here fails soft: bad input gives
// back an empty string or the raw value, never an error.

use crate::tables::KeywordTables;
use url::Url;

/// Raster and vector extensions accepted as image references.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp",
];

/// Directory tokens that conventionally hold image assets.
pub const IMAGE_DIRECTORIES: &[&str] = &[
    "/images/", "/image/", "/img/", "/imgs/", "/assets/", "/static/", "/media/", "/uploads/",
    "/logo",
];

/// Resolve `url_or_path` against `base`.
///
/// Data URIs pass through untouched. Anything that cannot be resolved is
/// returned exactly as given.
pub fn normalize(url_or_path: &str, base: &str) -> String {
    let trimmed = url_or_path.trim();
    if trimmed.is_empty() || is_data_uri(trimmed) {
        return url_or_path.to_string();
    }

    if let Ok(base_url) = Url::parse(base)
        && let Ok(resolved) = base_url.join(trimmed)
    {
        return resolved.to_string();
    }

    match Url::parse(trimmed) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => url_or_path.to_string(),
    }
}

/// Case-insensitive ASCII prefix test that never splits a multi-byte char.
fn has_prefix(url: &str, prefix: &str) -> bool {
    url.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

pub fn is_data_uri(url: &str) -> bool {
    has_prefix(url, "data:")
}

pub fn is_data_image(url: &str) -> bool {
    has_prefix(url, "data:image/")
}

pub fn is_inline_svg(url: &str) -> bool {
    has_prefix(url, "data:image/svg+xml")
}

pub fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_query(s: &str) -> &str {
    let end = s.find(['?', '#']).unwrap_or(s.len());
    &s[..end]
}

/// Last non-empty path segment of `url`. Empty for data URIs.
pub fn filename_of(url: &str) -> String {
    if is_data_uri(url) {
        return String::new();
    }

    if let Ok(parsed) = Url::parse(url) {
        return parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string();
    }

    strip_query(url)
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Lowercase extension of a filename, without the dot.
pub fn extension_of(filename: &str) -> String {
    let name = strip_query(filename);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') => {
            ext.to_ascii_lowercase()
        }
        _ => String::new(),
    }
}

pub fn pathname_of(url: &str) -> String {
    if is_data_uri(url) {
        return String::new();
    }
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default()
}

pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Path and query of an http(s) URL; the whole string for anything else.
///
/// Site-name matching runs against this so the page's own hostname does not
/// count as an identity signal for every same-site image.
pub fn identity_haystack(url: &str) -> String {
    if is_data_uri(url) {
        return String::new();
    }
    match Url::parse(url) {
        Ok(u) if u.host_str().is_some() => {
            let mut out = u.path().to_string();
            if let Some(q) = u.query() {
                out.push('?');
                out.push_str(q);
            }
            out.to_lowercase()
        }
        _ => url.to_lowercase(),
    }
}

/// Split `url` at its fragment identifier.
pub fn strip_fragment(url: &str) -> (String, Option<String>) {
    match url.split_once('#') {
        Some((file, fragment)) => {
            let fragment = (!fragment.is_empty()).then(|| fragment.to_string());
            (file.to_string(), fragment)
        }
        None => (url.to_string(), None),
    }
}

pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

pub fn is_same_or_subdomain(host: &str, site_domain: &str) -> bool {
    if host.is_empty() || site_domain.is_empty() {
        return false;
    }
    let host = strip_www(host);
    let site = strip_www(site_domain);
    host == site || host.ends_with(&format!(".{}", site))
}

/// True when the path is an accepted image asset: known extension or a
/// conventional image directory.
pub fn looks_like_image(url: &str) -> bool {
    if is_data_image(url) {
        return true;
    }
    let ext = extension_of(&filename_of(url));
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    let path = pathname_of(url).to_lowercase();
    IMAGE_DIRECTORIES.iter().any(|dir| path.contains(dir))
}

/// True when `href` resolved against `base` points at the site root.
pub fn is_homepage_href(href: &str, base: &str) -> bool {
    let resolved = normalize(href, base);
    let (Ok(target), Ok(base_url)) = (Url::parse(&resolved), Url::parse(base)) else {
        return false;
    };
    let (Some(target_host), Some(base_host)) = (target.host_str(), base_url.host_str()) else {
        return false;
    };
    if strip_www(target_host) != strip_www(base_host) {
        return false;
    }

    let path = target.path().trim_end_matches('/');
    path.is_empty() || path.starts_with("/index.") || path == "/home"
}

/// Derive the short brand token from a hostname.
///
/// `invest.debrecen.hu` gives `debrecen`, `www.acme.com` gives `acme`,
/// `blog.acme.co` gives `acme`. Best-effort only.
pub fn site_name_of(hostname: &str, tables: &KeywordTables) -> String {
    let host = hostname.trim().trim_end_matches('.').to_lowercase();
    let host = strip_www(&host);
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();

    match labels.len() {
        0 => String::new(),
        1 | 2 => labels[0].to_string(),
        n => {
            let main = labels[n - 2];
            let sub = labels[n - 3];
            if tables.is_common_subdomain(sub) {
                return main.to_string();
            }
            let weak = main.len() <= 2 || main.chars().all(|c| c.is_ascii_digit());
            if weak { sub.to_string() } else { main.to_string() }
        }
    }
}
