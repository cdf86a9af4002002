// DOM image harvester: walks one page snapshot through every discovery
// channel and returns the scored, deduplicated candidate list.

use crate::candidate::{BoundingBox, ImageCandidate, SourceKind};
use crate::page::{DomElement, PageSnapshot};
use crate::rank;
use crate::score::{self, SiteContext};
use crate::urls;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};

/// Attributes checked on `img`, in order.
const SOURCE_ATTRIBUTES: &[&str] = &[
    "src",
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-srcset",
    "srcset",
    "data-lazy",
    "data-url",
];

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"]*?))\s*\)"#).expect("valid css url regex")
});
static INLINE_BACKGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*?(url\(\s*(?:"[^"]*"|'[^']*'|[^)]*)\s*\))"#)
        .expect("valid inline background regex")
});
static MARKUP_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://[^\s"'<>()\\]+?\.(?:png|jpe?g|gif|svg|webp|avif|ico|bmp)(?:\?[^\s"'<>()\\]*)?"#,
    )
    .expect("valid markup image regex")
});
static SPRITE_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*["']([^"'#\s]+\.svg)(?:#([^"'\s]*))?["']"#)
        .expect("valid sprite href regex")
});

/// Why one element was skipped. Never escapes the harvester.
#[derive(Error, Debug)]
pub enum ElementError {
    #[error("no usable source attribute")]
    NoSource,

    #[error("not an image reference: {0}")]
    Rejected(String),

    #[error("malformed element: {0}")]
    Malformed(String),
}

/// Run `attempt` over every item, keeping what succeeds.
///
/// `Ok(None)` means the item simply had nothing to offer; `Err` is logged and
/// skipped. One bad element never stops the rest.
pub fn collect_best_effort<I, T, F>(channel: &str, items: I, mut attempt: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<Option<T>, ElementError>,
{
    let mut collected = Vec::new();
    let mut skipped = 0usize;

    for item in items {
        match attempt(item) {
            Ok(Some(value)) => collected.push(value),
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                debug!("[{}] skipping element: {}", channel, e);
            }
        }
    }

    debug!("[{}] {} candidate(s), {} skipped", channel, collected.len(), skipped);
    collected
}

/// Harvest, score and deduplicate every image reference on the page.
pub fn harvest(page: &PageSnapshot, base_url: &str, context: &SiteContext) -> Vec<ImageCandidate> {
    let harvester = Harvester {
        page,
        base_url,
        context,
    };

    let mut all = Vec::new();
    all.extend(harvester.tag_references());
    all.extend(harvester.inline_vectors());
    all.extend(harvester.sprite_references());
    all.extend(harvester.css_backgrounds());
    all.extend(harvester.inline_style_backgrounds());
    all.extend(harvester.markup_scan());
    all.extend(harvester.sprite_markup_scan());
    all.extend(harvester.data_attribute_scan());

    score::score_all(&mut all, context);
    let raw = all.len();
    let candidates = rank::dedupe(all);

    info!(
        "Harvested {} candidate(s) from {} ({} before dedup)",
        candidates.len(),
        base_url,
        raw
    );
    candidates
}

struct Harvester<'a> {
    page: &'a PageSnapshot,
    base_url: &'a str,
    context: &'a SiteContext,
}

impl Harvester<'_> {
    fn resolve(&self, raw: &str) -> String {
        urls::normalize(&raw.replace("&amp;", "&"), self.base_url)
    }

    fn is_in_header(&self, el: &DomElement) -> bool {
        std::iter::once(el)
            .chain(self.page.ancestors(el.index))
            .any(|e| {
                e.is("header")
                    || e.attr("role").is_some_and(|r| r.eq_ignore_ascii_case("banner"))
                    || marker_contains(e, &["header", "masthead"])
            })
    }

    fn is_in_navigation(&self, el: &DomElement) -> bool {
        std::iter::once(el)
            .chain(self.page.ancestors(el.index))
            .any(|e| {
                e.is("nav")
                    || e.attr("role").is_some_and(|r| r.eq_ignore_ascii_case("navigation"))
                    || marker_contains(e, &["nav", "menu"])
            })
    }

    fn is_in_homepage_anchor(&self, el: &DomElement) -> bool {
        self.page
            .closest(el.index, "a")
            .and_then(|a| a.attr("href"))
            .is_some_and(|href| urls::is_homepage_href(href, self.base_url))
    }

    fn is_only_child_of_anchor(&self, el: &DomElement) -> bool {
        self.page
            .parent_of(el.index)
            .is_some_and(|p| p.is("a") && p.children.len() == 1)
    }

    /// Copy element metadata and context flags onto a candidate.
    fn decorate(&self, candidate: &mut ImageCandidate, el: &DomElement) {
        candidate.alt_text = el.attr("alt").map(str::to_string);
        candidate.css_class = el.class().map(str::to_string);
        candidate.element_id = el.id().map(str::to_string);
        if let Some(parent) = self.page.parent_of(el.index) {
            candidate.parent_css_class = parent.class().map(str::to_string);
            candidate.parent_element_id = parent.id().map(str::to_string);
        }
        candidate.bounding_box = el.bounding_box;
        candidate.is_in_header_region = self.is_in_header(el);
        candidate.is_in_navigation_region = self.is_in_navigation(el);
        candidate.is_in_homepage_anchor = self.is_in_homepage_anchor(el);
        candidate.is_only_child_of_anchor = self.is_only_child_of_anchor(el);
    }

    fn candidate_for(&self, url: String, kind: SourceKind, el: &DomElement) -> ImageCandidate {
        let mut candidate = ImageCandidate::new(url, kind);
        self.decorate(&mut candidate, el);
        let (w, h) = box_size(el.bounding_box);
        candidate.width = w;
        candidate.height = h;
        candidate
    }

    /// Channel 1: `img` elements, including lazy-load attributes.
    fn tag_references(&self) -> Vec<ImageCandidate> {
        collect_best_effort("img", self.page.elements_by_tag("img"), |el| {
            let url = SOURCE_ATTRIBUTES
                .iter()
                .filter_map(|name| el.attr(name))
                .map(first_srcset_entry)
                .filter(|raw| !raw.is_empty())
                .map(|raw| self.resolve(raw))
                .find(|url| urls::is_http_url(url) || urls::is_data_image(url))
                .ok_or(ElementError::NoSource)?;

            if !urls::looks_like_image(&url) {
                return Err(ElementError::Rejected(url));
            }

            let mut candidate = self.candidate_for(url, SourceKind::TagReference, el);
            if let Some((w, h)) = el.natural_size.filter(|&(w, h)| w > 0 && h > 0) {
                candidate.width = w;
                candidate.height = h;
            } else if let (Some(w), Some(h)) = (parse_length(el.attr("width")), parse_length(el.attr("height"))) {
                candidate.width = w;
                candidate.height = h;
            }
            Ok(Some(candidate))
        })
    }

    /// Channel 2: inline `svg` elements, keyed by their serialized markup.
    fn inline_vectors(&self) -> Vec<ImageCandidate> {
        let top_level = self
            .page
            .elements_by_tag("svg")
            .filter(|el| !self.page.ancestors(el.index).any(|a| a.is("svg")));

        collect_best_effort("svg", top_level, |el| {
            let markup = el
                .outer_html
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .ok_or_else(|| ElementError::Malformed("svg without markup".into()))?;
            let url = format!("data:image/svg+xml;base64,{}", STANDARD.encode(markup));

            let mut candidate = self.candidate_for(url, SourceKind::InlineVector, el);
            let (w, h) = svg_dimensions(el);
            candidate.width = w;
            candidate.height = h;
            Ok(Some(candidate))
        })
    }

    /// Channel 3: `<use href="sprite.svg#id">` references.
    fn sprite_references(&self) -> Vec<ImageCandidate> {
        collect_best_effort("use", self.page.elements_by_tag("use"), |el| {
            let href = el.attr("href").map(str::trim).unwrap_or_default();
            if href.is_empty() || href.starts_with('#') {
                return Ok(None);
            }

            let (file, fragment) = urls::strip_fragment(&self.resolve(href));
            if !urls::is_http_url(&file) {
                return Err(ElementError::Rejected(file));
            }

            let container = self
                .page
                .ancestors(el.index)
                .find(|a| a.is("svg"))
                .unwrap_or(el);
            let mut candidate = self.candidate_for(file, SourceKind::VectorSpriteReference, container);
            candidate.is_logo_fragment = fragment
                .as_deref()
                .is_some_and(|f| self.context.tables.is_logo_fragment(f));
            Ok(Some(candidate))
        })
    }

    /// Channel 4: computed `background-image`.
    fn css_backgrounds(&self) -> Vec<ImageCandidate> {
        let styled = self
            .page
            .elements
            .iter()
            .filter(|el| el.computed_background.is_some());

        collect_best_effort("css-background", styled, |el| {
            let value = el.computed_background.as_deref().unwrap_or_default();
            self.background_candidate(value, SourceKind::CssBackground, el)
        })
    }

    /// Channel 5: raw `style` attribute text.
    fn inline_style_backgrounds(&self) -> Vec<ImageCandidate> {
        let styled = self.page.elements.iter().filter(|el| el.attr("style").is_some());

        collect_best_effort("inline-style", styled, |el| {
            let style = el.attr("style").unwrap_or_default();
            let Some(decl) = INLINE_BACKGROUND_RE.captures(style) else {
                return Ok(None);
            };
            self.background_candidate(&decl[1], SourceKind::InlineStyleBackground, el)
        })
    }

    fn background_candidate(
        &self,
        value: &str,
        kind: SourceKind,
        el: &DomElement,
    ) -> Result<Option<ImageCandidate>, ElementError> {
        if value.trim().is_empty() || value.trim().eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        let raw = extract_css_url(value)
            .ok_or_else(|| ElementError::Malformed(format!("no url() in {:?}", value)))?;
        let url = self.resolve(&raw);

        if !(urls::is_http_url(&url) || urls::is_data_image(&url)) || !urls::looks_like_image(&url) {
            return Err(ElementError::Rejected(url));
        }
        Ok(Some(self.candidate_for(url, kind, el)))
    }

    /// Channel 6: absolute image URLs anywhere in the markup, scripts and
    /// JSON islands included.
    fn markup_scan(&self) -> Vec<ImageCandidate> {
        let markup = self.page.markup.replace("\\/", "/");
        let matches: Vec<String> = MARKUP_IMAGE_RE
            .find_iter(&markup)
            .map(|m| m.as_str().replace("&amp;", "&"))
            .collect();

        collect_best_effort("markup", matches, |url| {
            Ok(Some(ImageCandidate::new(url, SourceKind::MarkupTextScan)))
        })
    }

    /// Channel 6b: `href="...svg#fragment"` references outside live `use` elements.
    fn sprite_markup_scan(&self) -> Vec<ImageCandidate> {
        let hits: Vec<(String, Option<String>)> = SPRITE_HREF_RE
            .captures_iter(&self.page.markup)
            .map(|c| (c[1].to_string(), c.get(2).map(|m| m.as_str().to_string())))
            .collect();

        collect_best_effort("sprite-markup", hits, |(href, fragment)| {
            let url = self.resolve(&href);
            if !urls::is_http_url(&url) {
                return Err(ElementError::Rejected(url));
            }
            let mut candidate = ImageCandidate::new(url, SourceKind::SpriteMarkupScan);
            candidate.is_logo_fragment = fragment
                .as_deref()
                .is_some_and(|f| self.context.tables.is_logo_fragment(f));
            Ok(Some(candidate))
        })
    }

    /// Channel 7: image URLs tucked into `data-*` attributes. Left unscored.
    fn data_attribute_scan(&self) -> Vec<ImageCandidate> {
        let values = self.page.elements.iter().flat_map(|el| {
            el.attributes
                .iter()
                .filter(|(name, _)| name.to_ascii_lowercase().starts_with("data-"))
                .map(|(_, value)| value.as_str())
        });

        collect_best_effort("data-attribute", values, |value| {
            Ok(MARKUP_IMAGE_RE
                .find(value)
                .map(|m| ImageCandidate::new(m.as_str().to_string(), SourceKind::DataAttributeScan)))
        })
    }
}

fn marker_contains(el: &DomElement, tokens: &[&str]) -> bool {
    [el.class(), el.id()]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .any(|marker| tokens.iter().any(|t| marker.contains(t)))
}

/// First URL of a `srcset` list; plain `src` values pass through.
fn first_srcset_entry(value: &str) -> &str {
    let value = value.trim();
    if urls::is_data_uri(value) {
        return value;
    }
    value
        .split(',')
        .next()
        .and_then(|entry| entry.split_whitespace().next())
        .unwrap_or_default()
}

/// The URL inside the first `url(...)` of a CSS value.
pub fn extract_css_url(value: &str) -> Option<String> {
    let caps = CSS_URL_RE.captures(value)?;
    let raw = caps.get(1).or(caps.get(2)).or(caps.get(3))?.as_str().trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Pixel length from an attribute like `120`, `120px` or `120.5`.
fn parse_length(value: Option<&str>) -> Option<u32> {
    let v = value?.trim().trim_end_matches("px").trim();
    let n: f64 = v.parse().ok()?;
    (n > 0.0 && n.is_finite()).then(|| n.round() as u32)
}

fn box_size(bounds: Option<BoundingBox>) -> (u32, u32) {
    bounds.map_or((0, 0), |b| (b.width().round() as u32, b.height().round() as u32))
}

/// Width/height attributes, then the view box, then the live box.
fn svg_dimensions(el: &DomElement) -> (u32, u32) {
    if let (Some(w), Some(h)) = (parse_length(el.attr("width")), parse_length(el.attr("height"))) {
        return (w, h);
    }

    if let Some(view_box) = el.attr("viewBox") {
        let parts: Vec<f64> = view_box
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .filter_map(|p| p.parse().ok())
            .collect();
        if let [_, _, w, h] = parts[..]
            && w > 0.0
            && h > 0.0
        {
            return (w.round() as u32, h.round() as u32);
        }
    }

    box_size(el.bounding_box)
}
