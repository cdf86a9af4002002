// Composite logo score. Every signal group is its own function returning a
// signed contribution; `score` sums them. No I/O, no state, missing fields
// contribute nothing.

use crate::candidate::{ImageCandidate, SourceKind};
use crate::page::Viewport;
use crate::tables::KeywordTables;
use crate::urls;
use regex::Regex;
use std::sync::LazyLock;

/// Signal weights. Magnitudes are tunable; the relative order is not:
/// identity > class/id "logo" > lexical "logo" > alt text > structure > geometry.
pub mod weights {
    pub const SITE_NAME_MATCH: i32 = 50;
    pub const SITE_NAME_PREFIX: i32 = 20;
    pub const FOREIGN_LOGO: i32 = -25;
    pub const FOREIGN_LOGO_ORGANIZATION: i32 = -40;
    pub const FOREIGN_LOGO_OFFSET: i32 = -10;

    pub const THIRD_PARTY: i32 = -40;
    pub const THIRD_PARTY_ALT: i32 = -20;
    pub const PARTNER_SEGMENT: i32 = -30;
    pub const PARTNER_WORD: i32 = -20;
    pub const HASHED_FILENAME: i32 = -5;

    pub const VECTOR_SOURCE: i32 = 15;
    pub const VECTOR_PROMINENT: i32 = 10;
    pub const LOGO_FRAGMENT: i32 = 20;

    pub const DOMAIN_SAME: i32 = 10;
    pub const DOMAIN_CONTAINS: i32 = 5;

    pub const LOGO_KEYWORD: i32 = 30;
    pub const LOGO_PREFIX: i32 = 10;
    pub const LOGO_VARIANT: i32 = 10;
    pub const LOGO_DIRECTORY: i32 = 5;
    pub const LOGO_CLEAN: i32 = 5;
    pub const SECONDARY_KEYWORD: i32 = 5;

    pub const ALT_LOGO: i32 = 25;
    pub const ALT_SITE_NAME: i32 = 25;
    pub const ALT_SHORT_TOKEN: i32 = 10;
    pub const ALT_COMPANY_HOME: i32 = 5;

    pub const ATTR_LOGO: i32 = 40;
    pub const ATTR_BRAND: i32 = 15;
    pub const ATTR_HEADER_NAV: i32 = 5;
    pub const PARENT_CONTEXT: i32 = 10;

    pub const TOP_200: i32 = 10;
    pub const TOP_100: i32 = 5;
    pub const LEFT_100: i32 = 10;
    pub const TOP_LEFT_LOGO: i32 = 10;

    pub const DIMENSION_MEDIUM: i32 = 5;
    pub const ASPECT_RATIO: i32 = 10;
    pub const TOO_SMALL: i32 = -5;
    pub const TOO_LARGE: i32 = -10;
    pub const TOO_LARGE_WITH_LOGO: i32 = -5;

    pub const IN_HEADER: i32 = 15;
    pub const IN_NAVIGATION: i32 = 10;
    pub const HOMEPAGE_ANCHOR: i32 = 20;
    pub const ONLY_CHILD_OF_ANCHOR: i32 = 5;
    pub const VECTOR_HEADER_NAV: i32 = 10;
    pub const VECTOR_HOMEPAGE: i32 = 10;
}

use weights::*;

static HEX_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9a-f]{8,}").expect("valid hex run regex"));
static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{6,}").expect("valid digit run regex"));
static LOGO_VARIANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"logo[-_](full|white|black|color|colour|main|site|primary|dark|light|horizontal)",
    )
    .expect("valid logo variant regex")
});

const SECONDARY_KEYWORDS: &[&str] = &["brand", "header", "site", "company"];
const LOGO_DIRECTORIES: &[&str] = &["/logo/", "/logos/", "/brand/", "/assets/", "/images/", "/img/"];
const PARENT_TOKENS: &[&str] = &["logo", "brand", "header", "nav", "site-identity"];

/// Per-page inputs the scorer compares candidates against.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub site_name: String,
    pub site_domain: String,
    pub viewport: Viewport,
    pub tables: KeywordTables,
}

impl SiteContext {
    pub fn new(page_url: &str) -> Self {
        Self::with_tables(page_url, KeywordTables::default())
    }

    pub fn with_tables(page_url: &str, tables: KeywordTables) -> Self {
        let host = urls::domain_of(page_url);
        let site_name = urls::site_name_of(&host, &tables);
        Self {
            site_name,
            site_domain: urls::strip_www(&host).to_string(),
            viewport: Viewport::default(),
            tables,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Names of two characters or fewer are too noisy to match on.
    pub fn has_identity(&self) -> bool {
        self.site_name.chars().count() > 2
    }

    /// Site name appears in the candidate's filename or URL path.
    pub fn matches_identity(&self, candidate: &ImageCandidate) -> bool {
        self.has_identity()
            && (candidate.filename.to_lowercase().contains(&self.site_name)
                || urls::identity_haystack(&candidate.url).contains(&self.site_name))
    }
}

/// Lowercased views of the candidate's text fields.
struct Signals {
    filename: String,
    haystack: String,
    path: String,
    alt: String,
    class: String,
    id: String,
    parent_class: String,
    parent_id: String,
}

impl Signals {
    fn new(c: &ImageCandidate) -> Self {
        let lower = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_lowercase();
        Self {
            filename: c.filename.to_lowercase(),
            haystack: urls::identity_haystack(&c.url),
            path: c.pathname.to_lowercase(),
            alt: lower(&c.alt_text),
            class: lower(&c.css_class),
            id: lower(&c.element_id),
            parent_class: lower(&c.parent_css_class),
            parent_id: lower(&c.parent_element_id),
        }
    }

    fn attr_logo(&self) -> bool {
        self.class.contains("logo") || self.id.contains("logo")
    }

    fn strong_logo(&self) -> bool {
        self.attr_logo() || self.alt.contains("logo")
    }

    fn hashed(&self) -> bool {
        let stem = self
            .filename
            .rsplit_once('.')
            .map_or(self.filename.as_str(), |(stem, _)| stem);
        HEX_RUN_RE
            .find_iter(stem)
            .any(|m| m.as_str().chars().any(|ch| ch.is_ascii_digit()))
            || DIGIT_RUN_RE.is_match(stem)
    }
}

pub fn score(candidate: &ImageCandidate, context: &SiteContext) -> i32 {
    let s = Signals::new(candidate);

    site_identity(&s, context)
        + third_party(&s, context)
        + partner_content(&s, context)
        + hashed_filename(&s)
        + source_type(candidate, context)
        + domain_affinity(candidate, context)
        + lexical(&s)
        + alt_text(&s, context)
        + class_and_id(&s)
        + parent_context(&s)
        + position(candidate, &s)
        + geometry(candidate, &s)
        + structure(candidate)
}

/// Score every candidate except data-attribute hits, which stay unscored.
pub fn score_all(candidates: &mut [ImageCandidate], context: &SiteContext) {
    for candidate in candidates.iter_mut() {
        if candidate.source_kind != SourceKind::DataAttributeScan {
            candidate.score = Some(score(candidate, context));
        }
    }
}

fn site_identity(s: &Signals, context: &SiteContext) -> i32 {
    if !context.has_identity() {
        return 0;
    }
    let name = context.site_name.as_str();

    if s.filename.contains(name) || s.haystack.contains(name) {
        let standalone = s
            .filename
            .strip_prefix(name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['-', '_', '.', ' ']));
        return SITE_NAME_MATCH + if standalone { SITE_NAME_PREFIX } else { 0 };
    }

    if !s.filename.contains("logo") {
        0
    } else if context.tables.has_organization_token(&s.filename) {
        FOREIGN_LOGO_ORGANIZATION
    } else if s.strong_logo() {
        FOREIGN_LOGO_OFFSET
    } else {
        FOREIGN_LOGO
    }
}

/// First third-party name in `text` that is not the site's own brand.
fn foreign_brand<'a>(text: &str, context: &'a SiteContext) -> Option<&'a str> {
    context.tables.foreign_brand_in(text, &context.site_name)
}

fn third_party(s: &Signals, context: &SiteContext) -> i32 {
    let text = format!("{} {}", s.filename, s.haystack);
    if foreign_brand(&text, context).is_some() {
        THIRD_PARTY
    } else {
        0
    }
}

fn partner_content(s: &Signals, context: &SiteContext) -> i32 {
    let mut total = 0;
    if context.tables.has_partner_segment(&s.path) {
        total += PARTNER_SEGMENT;
    }
    if context.tables.has_partner_word(&s.filename) && !s.filename.contains("logo") {
        total += PARTNER_WORD;
    }
    total
}

fn hashed_filename(s: &Signals) -> i32 {
    if s.hashed() { HASHED_FILENAME } else { 0 }
}

fn in_top_left_quadrant(candidate: &ImageCandidate, viewport: &Viewport) -> bool {
    candidate
        .bounding_box
        .is_some_and(|b| b.left < viewport.width / 2.0 && b.top < viewport.height / 2.0)
}

fn source_type(candidate: &ImageCandidate, context: &SiteContext) -> i32 {
    let mut total = 0;
    if candidate.is_vector() {
        total += VECTOR_SOURCE;
        if candidate.is_in_header_region
            || candidate.is_in_navigation_region
            || candidate.is_in_homepage_anchor
            || in_top_left_quadrant(candidate, &context.viewport)
        {
            total += VECTOR_PROMINENT;
        }
    }
    if candidate.is_logo_fragment {
        total += LOGO_FRAGMENT;
    }
    total
}

fn domain_affinity(candidate: &ImageCandidate, context: &SiteContext) -> i32 {
    let domain = candidate.domain.as_str();
    if domain.is_empty() || context.site_domain.is_empty() {
        return 0;
    }
    if urls::is_same_or_subdomain(domain, &context.site_domain) {
        DOMAIN_SAME
    } else if domain.contains(&context.site_domain)
        || (context.has_identity() && domain.contains(&context.site_name))
    {
        DOMAIN_CONTAINS
    } else {
        0
    }
}

fn lexical(s: &Signals) -> i32 {
    let mut total = 0;

    if s.filename.contains("logo") || s.path.contains("logo") {
        total += LOGO_KEYWORD;
        if s.filename.starts_with("logo-") || s.filename.starts_with("logo_") {
            total += LOGO_PREFIX;
        }
        if LOGO_VARIANT_RE.is_match(&s.filename) {
            total += LOGO_VARIANT;
        }
        if LOGO_DIRECTORIES.iter().any(|dir| s.path.contains(dir)) {
            total += LOGO_DIRECTORY;
        }
        if !s.hashed() {
            total += LOGO_CLEAN;
        }
    }

    for keyword in SECONDARY_KEYWORDS {
        if s.filename.contains(keyword) || s.path.contains(keyword) {
            total += SECONDARY_KEYWORD;
        }
    }

    total
}

fn alt_text(s: &Signals, context: &SiteContext) -> i32 {
    if s.alt.is_empty() {
        return 0;
    }
    let mut total = 0;

    if s.alt.contains("logo") {
        total += ALT_LOGO;
    }
    if context.has_identity() && s.alt.contains(&context.site_name) {
        total += ALT_SITE_NAME;
    }

    let foreign = foreign_brand(&s.alt, context).is_some();
    if foreign {
        total += THIRD_PARTY_ALT;
    } else if !s.alt.contains(char::is_whitespace) && s.alt.chars().count() <= 30 {
        total += ALT_SHORT_TOKEN;
    }

    if s.alt.contains("company") || s.alt.contains("home") {
        total += ALT_COMPANY_HOME;
    }
    total
}

fn attribute_signals(value: &str) -> i32 {
    if value.is_empty() {
        return 0;
    }
    let mut total = 0;
    if value.contains("logo") {
        total += ATTR_LOGO;
    }
    if value.contains("brand") || value.contains("site-identity") {
        total += ATTR_BRAND;
    }
    if value.contains("header") || value.contains("nav") {
        total += ATTR_HEADER_NAV;
    }
    total
}

fn class_and_id(s: &Signals) -> i32 {
    attribute_signals(&s.class) + attribute_signals(&s.id)
}

fn parent_context(s: &Signals) -> i32 {
    let hit = PARENT_TOKENS
        .iter()
        .any(|t| s.parent_class.contains(t) || s.parent_id.contains(t));
    if hit { PARENT_CONTEXT } else { 0 }
}

fn position(candidate: &ImageCandidate, s: &Signals) -> i32 {
    let Some(bounds) = candidate.bounding_box else {
        return 0;
    };
    let mut total = 0;
    let near_top = bounds.top < 200.0;
    let near_left = bounds.left < 100.0;

    if near_top {
        total += TOP_200;
        if bounds.top < 100.0 {
            total += TOP_100;
        }
    }
    if near_left {
        total += LEFT_100;
    }
    if near_top && near_left && s.attr_logo() {
        total += TOP_LEFT_LOGO;
    }
    total
}

fn geometry(candidate: &ImageCandidate, s: &Signals) -> i32 {
    let (w, h) = (candidate.width, candidate.height);
    let mut total = 0;

    if (100..=400).contains(&w) {
        total += DIMENSION_MEDIUM;
    }
    if (100..=400).contains(&h) {
        total += DIMENSION_MEDIUM;
    }
    if w > 0 && h > 0 {
        let ratio = w as f64 / h as f64;
        if (1.0..=3.0).contains(&ratio) {
            total += ASPECT_RATIO;
        }
    }
    if (w > 0 && w < 50) || (h > 0 && h < 50) {
        total += TOO_SMALL;
    }
    if w > 800 || h > 800 {
        total += if s.strong_logo() {
            TOO_LARGE_WITH_LOGO
        } else {
            TOO_LARGE
        };
    }
    total
}

fn structure(candidate: &ImageCandidate) -> i32 {
    let mut total = 0;
    if candidate.is_in_header_region {
        total += IN_HEADER;
    }
    if candidate.is_in_navigation_region {
        total += IN_NAVIGATION;
    }
    if candidate.is_in_homepage_anchor {
        total += HOMEPAGE_ANCHOR;
    }
    if candidate.is_only_child_of_anchor {
        total += ONLY_CHILD_OF_ANCHOR;
    }
    if candidate.is_vector() {
        if candidate.is_in_header_region || candidate.is_in_navigation_region {
            total += VECTOR_HEADER_NAV;
        }
        if candidate.is_in_homepage_anchor {
            total += VECTOR_HOMEPAGE;
        }
    }
    total
}
