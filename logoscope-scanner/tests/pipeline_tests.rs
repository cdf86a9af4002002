// End-to-end tests: snapshot -> harvest -> rank -> select

use logoscope_scanner::{
    BoundingBox, ImageCandidate, PageSnapshot, SiteContext, SourceKind, favicon_candidate,
    find_favicon, harvest, rank, select_top,
};

const SITE: &str = "https://acme.com/";

fn snapshot(html: &str) -> PageSnapshot {
    PageSnapshot::from_html(SITE, html)
}

/// Give the first element carrying `class` a layout box, as a browser would.
fn place(page: &mut PageSnapshot, class: &str, bounds: BoundingBox) {
    let el = page
        .elements
        .iter_mut()
        .find(|el| el.class() == Some(class))
        .expect("element with class");
    el.bounding_box = Some(bounds);
}

fn run(page: &PageSnapshot) -> Vec<ImageCandidate> {
    let context = SiteContext::new(SITE);
    rank(harvest(page, SITE, &context), &context)
}

// ============================================================================
// Selection scenarios
// ============================================================================

#[test]
fn test_site_logo_in_header_is_selected() {
    let mut page = snapshot(
        r#"<html><body>
            <header class="top">
                <a href="/"><img class="site-logo" src="/img/acme-logo.png" alt="Acme"></a>
            </header>
            <main>
                <img src="/uploads/2023/team-photo.jpg" alt="Our team">
                <img src="https://cdn.social.net/icons/facebook.png" alt="Facebook">
            </main>
        </body></html>"#,
    );
    place(&mut page, "site-logo", BoundingBox::new(40.0, 20.0, 180.0, 60.0));

    let ranked = run(&page);
    let context = SiteContext::new(SITE);
    let top = select_top(&ranked, &context).expect("a logo");

    assert_eq!(top.url, "https://acme.com/img/acme-logo.png");
    assert!(top.score.unwrap() > 0);
    assert_eq!((top.width, top.height), (180, 60));
}

#[test]
fn test_generic_logo_file_with_logo_alt_is_selected() {
    let mut page = snapshot(
        r#"<html><body>
            <img class="site-logo" alt="Acme logo" src="https://acme.com/assets/images/logo-full-color.png">
        </body></html>"#,
    );
    place(&mut page, "site-logo", BoundingBox::new(40.0, 20.0, 180.0, 60.0));

    let ranked = run(&page);
    let top = select_top(&ranked, &SiteContext::new(SITE)).expect("a logo");

    assert_eq!(top.url, "https://acme.com/assets/images/logo-full-color.png");
    assert_eq!(top.source_kind, SourceKind::TagReference);
    assert!(top.score.unwrap() > 0);
}

#[test]
fn test_partner_badge_is_not_selected() {
    let page = snapshot(
        r#"<html><body>
            <footer><img src="/partners/stripe-badge.png"></footer>
        </body></html>"#,
    );

    let ranked = run(&page);
    let badge = ranked
        .iter()
        .find(|c| c.url == "https://acme.com/partners/stripe-badge.png")
        .expect("badge harvested");

    assert!(badge.score.unwrap() <= 0);
    assert!(select_top(&ranked, &SiteContext::new(SITE)).is_none());
}

#[test]
fn test_header_vector_beats_raster_badge() {
    let page = snapshot(
        r#"<html><body>
            <header><a href="/"><svg viewBox="0 0 200 60"><path d="M0 0h200v60H0z"/></svg></a></header>
            <section class="partners"><img src="/images/stripe-badge.png" width="200" height="80"></section>
        </body></html>"#,
    );

    let ranked = run(&page);
    let top = select_top(&ranked, &SiteContext::new(SITE)).expect("a logo");
    assert_eq!(top.source_kind, SourceKind::InlineVector);
    assert!(top.is_in_header_region);
}

#[test]
fn test_site_named_markup_hit_outranks_unnamed_tag() {
    let page = snapshot(
        r#"<html><body>
            <header><img class="logo" src="/img/header-logo.png"></header>
            <script>window.__CONFIG__ = {"brandAsset": "https://static.cdnhost.net/media/acme.png"};</script>
        </body></html>"#,
    );

    let ranked = run(&page);
    assert_eq!(ranked[0].url, "https://static.cdnhost.net/media/acme.png");
    assert_eq!(ranked[0].source_kind, SourceKind::MarkupTextScan);
}

// ============================================================================
// Favicon fallback
// ============================================================================

#[test]
fn test_favicon_fallback_when_nothing_viable() {
    let page = snapshot(
        r#"<html><head><link rel="icon" href="/static/favicon-32.png"></head>
        <body><img src="/ads/sponsor-banner.gif"></body></html>"#,
    );

    let ranked = run(&page);
    assert!(select_top(&ranked, &SiteContext::new(SITE)).is_none());

    let icon = find_favicon(&page, SITE).expect("favicon url");
    assert_eq!(icon, "https://acme.com/static/favicon-32.png");

    let fallback = favicon_candidate(&icon);
    assert!(fallback.is_favicon);
    assert_eq!(fallback.score, Some(0));
}

// ============================================================================
// Deduplication across channels
// ============================================================================

#[test]
fn test_each_url_appears_once() {
    let page = snapshot(
        r#"<html><head><style>.hero { background-image: url(/img/logo.png) }</style></head>
        <body>
            <img src="https://acme.com/img/logo.png">
            <div class="hero" style="background: url('/img/logo.png')"></div>
            <script>var x = "https://acme.com/img/logo.png";</script>
        </body></html>"#,
    );

    let ranked = run(&page);
    let hits: Vec<_> = ranked
        .iter()
        .filter(|c| c.url == "https://acme.com/img/logo.png")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source_kind, SourceKind::TagReference);
}

#[test]
fn test_distinct_inline_vectors_stay_distinct() {
    let page = snapshot(
        r#"<body>
            <svg><circle r="4"/></svg>
            <svg><circle r="5"/></svg>
        </body>"#,
    );

    let vectors = run(&page)
        .into_iter()
        .filter(|c| c.source_kind == SourceKind::InlineVector)
        .count();
    assert_eq!(vectors, 2);
}
