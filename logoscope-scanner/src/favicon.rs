use crate::candidate::{ImageCandidate, SourceKind};
use crate::page::PageSnapshot;
use crate::urls;
use std::cmp::Reverse;
use tracing::debug;
use url::Url;

fn icon_rank(rel: &str) -> Option<u8> {
    let tokens: Vec<String> = rel.split_whitespace().map(str::to_ascii_lowercase).collect();
    let has = |t: &str| tokens.iter().any(|token| token == t);

    if has("apple-touch-icon") || has("apple-touch-icon-precomposed") {
        Some(3)
    } else if has("shortcut") && has("icon") {
        Some(1)
    } else if has("icon") {
        Some(2)
    } else {
        None
    }
}

/// Best icon link on the page, else `/favicon.ico` at the origin.
///
/// Returns `None` only when `base_url` has no usable origin.
pub fn find_favicon(page: &PageSnapshot, base_url: &str) -> Option<String> {
    let best = page
        .elements_by_tag("link")
        .filter_map(|link| {
            let rank = icon_rank(link.attr("rel")?)?;
            let href = link.attr("href").map(str::trim).filter(|h| !h.is_empty())?;
            Some((rank, href))
        })
        // min over the reversed rank keeps the first of equal links
        .min_by_key(|(rank, _)| Reverse(*rank))
        .map(|(_, href)| urls::normalize(href, base_url))
        .filter(|url| urls::is_http_url(url) || urls::is_data_image(url));

    if let Some(url) = best {
        debug!("Favicon link found: {}", url);
        return Some(url);
    }

    let origin = Url::parse(base_url).ok()?;
    if !matches!(origin.scheme(), "http" | "https") {
        return None;
    }
    origin.join("/favicon.ico").ok().map(|u| u.to_string())
}

/// The fallback record offered when no harvested candidate is viable.
pub fn favicon_candidate(url: &str) -> ImageCandidate {
    let mut candidate = ImageCandidate::new(url.to_string(), SourceKind::FaviconFallback);
    candidate.is_favicon = true;
    candidate.score = Some(0);
    candidate
}
