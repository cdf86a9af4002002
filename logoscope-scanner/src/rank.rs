use crate::candidate::{ImageCandidate, SourceKind};
use crate::score::SiteContext;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use tracing::debug;

/// Score gap inside which a vector candidate is promoted over a raster one.
pub const TIE_BAND: i32 = 15;

/// Sort key, smallest first.
///
/// Adding the band to vector scores is the same as promoting the vector side
/// of any vector/raster pair whose gap is under the band, and keeps the
/// comparator a total order.
fn sort_key(c: &ImageCandidate, context: &SiteContext) -> (bool, bool, Reverse<i32>, Reverse<i32>, Reverse<u8>) {
    let score = c.score_or_zero();
    let banded = if c.is_vector() { score + TIE_BAND } else { score };
    (
        !context.matches_identity(c),
        c.score.is_none(),
        Reverse(banded),
        Reverse(score),
        Reverse(c.source_kind.priority()),
    )
}

/// Ordering used by [`rank`]: site identity first, unscored last, then
/// score with the vector tie band, then channel priority.
pub fn compare(a: &ImageCandidate, b: &ImageCandidate, context: &SiteContext) -> Ordering {
    sort_key(a, context).cmp(&sort_key(b, context))
}

/// Full ranked order. Equal candidates keep discovery order.
pub fn rank(mut candidates: Vec<ImageCandidate>, context: &SiteContext) -> Vec<ImageCandidate> {
    candidates.sort_by_cached_key(|c| sort_key(c, context));
    candidates
}

/// The single most likely logo, or `None` when nothing scores above zero.
///
/// `candidates` should be in [`rank`] order. A viable candidate carrying the
/// site name is still preferred when the slice was not ranked.
pub fn select_top<'a>(candidates: &'a [ImageCandidate], context: &SiteContext) -> Option<&'a ImageCandidate> {
    if let Some(conclusive) = candidates.iter().find(|c| is_conclusive(c)) {
        debug!("Conclusive header vector background: {}", conclusive.filename);
        return Some(conclusive);
    }
    let mut viable = candidates.iter().filter(|c| c.is_viable());
    let first = viable.clone().next();
    viable.find(|c| context.matches_identity(c)).or(first)
}

/// A logo-classed CSS background that is an inline vector inside the header.
fn is_conclusive(c: &ImageCandidate) -> bool {
    c.source_kind == SourceKind::CssBackground
        && c.url.to_ascii_lowercase().starts_with("data:image/svg+xml")
        && c.css_class
            .as_deref()
            .is_some_and(|class| class.to_lowercase().contains("logo"))
        && c.is_in_header_region
}

/// One candidate per URL, first discovery wins.
///
/// The exception is a logo or header sprite reference, which takes over the
/// slot of a weaker record for the same sprite file.
pub fn dedupe(candidates: Vec<ImageCandidate>) -> Vec<ImageCandidate> {
    let mut kept: Vec<ImageCandidate> = Vec::with_capacity(candidates.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        match seen.get(&candidate.url) {
            Some(&slot) => {
                if supersedes(&candidate, &kept[slot]) {
                    debug!(
                        "Sprite reference replaces {} record for {}",
                        kept[slot].source_kind.as_str(),
                        candidate.url
                    );
                    kept[slot] = candidate;
                }
            }
            None => {
                seen.insert(candidate.url.clone(), kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

fn supersedes(new: &ImageCandidate, old: &ImageCandidate) -> bool {
    if new.source_kind != SourceKind::VectorSpriteReference {
        return false;
    }
    if !(new.is_logo_fragment || new.is_in_header_region) {
        return false;
    }

    old.source_kind.priority() < new.source_kind.priority()
        || (old.source_kind == SourceKind::VectorSpriteReference
            && !old.is_logo_fragment
            && new.is_logo_fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SiteContext {
        SiteContext::new("https://acme.com/")
    }

    fn scored(url: &str, kind: SourceKind, score: i32) -> ImageCandidate {
        let mut c = ImageCandidate::new(url.to_string(), kind);
        c.score = Some(score);
        c
    }

    fn urls_of(list: &[ImageCandidate]) -> Vec<&str> {
        list.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_site_identity_overrides_score() {
        let a = scored("https://cdn.x.com/acme-mark.png", SourceKind::MarkupTextScan, 5);
        let b = scored("https://acme.com/logo.png", SourceKind::TagReference, 50);

        let ranked = rank(vec![b, a], &ctx());
        assert_eq!(ranked[0].url, "https://cdn.x.com/acme-mark.png");
        assert_eq!(select_top(&ranked, &ctx()).unwrap().url, ranked[0].url);
    }

    #[test]
    fn test_select_top_keeps_identity_partition_on_unranked_input() {
        let stranger = scored("https://acme.com/logo.png", SourceKind::TagReference, 80);
        let own = scored("https://cdn.x.com/acme-mark.png", SourceKind::MarkupTextScan, 5);
        let negative_own = scored("https://cdn.x.com/acme-old.png", SourceKind::TagReference, -3);

        let unranked = vec![stranger.clone(), negative_own, own];
        assert_eq!(select_top(&unranked, &ctx()).unwrap().url, "https://cdn.x.com/acme-mark.png");

        let no_identity = vec![stranger];
        assert_eq!(select_top(&no_identity, &ctx()).unwrap().url, "https://acme.com/logo.png");
    }

    #[test]
    fn test_vector_promoted_inside_tie_band() {
        let vector = scored("data:image/svg+xml;base64,PHN2Zy8+", SourceKind::InlineVector, 40);
        let raster = scored("https://acme.com/header.png", SourceKind::TagReference, 50);

        let ranked = rank(vec![raster.clone(), vector.clone()], &ctx());
        assert!(ranked[0].is_vector());

        let raster = scored("https://acme.com/header.png", SourceKind::TagReference, 60);
        let ranked = rank(vec![vector, raster], &ctx());
        assert!(!ranked[0].is_vector());
    }

    #[test]
    fn test_exact_band_gap_keeps_score_order() {
        let vector = scored("https://acme.com/sprite.svg", SourceKind::VectorSpriteReference, 35);
        let raster = scored("https://acme.com/header.png", SourceKind::TagReference, 50);

        let ranked = rank(vec![vector, raster], &ctx());
        assert_eq!(ranked[0].url, "https://acme.com/header.png");
    }

    #[test]
    fn test_header_vector_beats_partner_badge() {
        let mut vector = scored("data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=", SourceKind::InlineVector, 38);
        vector.is_in_header_region = true;
        let badge = scored("https://acme.com/partners/stripe-badge.png", SourceKind::TagReference, 45);

        let ranked = rank(vec![badge, vector], &ctx());
        assert_eq!(select_top(&ranked, &ctx()).unwrap().source_kind, SourceKind::InlineVector);
    }

    #[test]
    fn test_priority_breaks_equal_scores() {
        let markup = scored("https://acme.com/a.png", SourceKind::MarkupTextScan, 20);
        let css = scored("https://acme.com/b.png", SourceKind::CssBackground, 20);
        let inline = scored("https://acme.com/c.png", SourceKind::InlineStyleBackground, 20);

        let ranked = rank(vec![markup, inline, css], &ctx());
        assert_eq!(
            urls_of(&ranked),
            vec!["https://acme.com/b.png", "https://acme.com/c.png", "https://acme.com/a.png"]
        );
    }

    #[test]
    fn test_unscored_rank_last_and_never_selected() {
        let data = ImageCandidate::new("https://acme.com/x.png".into(), SourceKind::DataAttributeScan);
        let negative = scored("https://acme.com/y.png", SourceKind::TagReference, -10);

        let ranked = rank(vec![data, negative], &ctx());
        assert_eq!(ranked[1].source_kind, SourceKind::DataAttributeScan);
        assert!(select_top(&ranked, &ctx()).is_none());
    }

    #[test]
    fn test_compare_is_consistent_with_rank() {
        let a = scored("https://acme.com/a.png", SourceKind::TagReference, 10);
        let b = scored("https://acme.com/b.png", SourceKind::TagReference, 30);
        assert_eq!(compare(&a, &b, &ctx()), Ordering::Greater);
        assert_eq!(compare(&b, &b, &ctx()), Ordering::Equal);
    }

    #[test]
    fn test_conclusive_background_short_circuits() {
        let top = scored("https://acme.com/acme-logo.png", SourceKind::TagReference, 120);
        let mut bg = scored("data:image/svg+xml;utf8,<svg/>", SourceKind::CssBackground, 3);
        bg.css_class = Some("Header-Logo".into());
        bg.is_in_header_region = true;

        let ranked = rank(vec![top, bg], &ctx());
        assert_eq!(select_top(&ranked, &ctx()).unwrap().source_kind, SourceKind::CssBackground);
    }

    #[test]
    fn test_dedupe_first_wins() {
        let tag = scored("https://acme.com/logo.png", SourceKind::TagReference, 10);
        let markup = scored("https://acme.com/logo.png", SourceKind::MarkupTextScan, 99);

        let out = dedupe(vec![tag, markup]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_kind, SourceKind::TagReference);
    }

    #[test]
    fn test_logo_sprite_replaces_weaker_record_in_place() {
        let markup = scored("https://acme.com/sprite.svg", SourceKind::MarkupTextScan, 5);
        let other = scored("https://acme.com/other.png", SourceKind::TagReference, 5);
        let mut sprite = scored("https://acme.com/sprite.svg", SourceKind::VectorSpriteReference, 40);
        sprite.is_logo_fragment = true;

        let out = dedupe(vec![markup, other, sprite]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source_kind, SourceKind::VectorSpriteReference);
        assert_eq!(out[1].url, "https://acme.com/other.png");
    }

    #[test]
    fn test_plain_sprite_does_not_replace() {
        let markup = scored("https://acme.com/sprite.svg", SourceKind::MarkupTextScan, 5);
        let sprite = scored("https://acme.com/sprite.svg", SourceKind::VectorSpriteReference, 40);

        let out = dedupe(vec![markup, sprite]);
        assert_eq!(out[0].source_kind, SourceKind::MarkupTextScan);
    }
}
