// Page snapshot: the element table one in-page evaluation returns.
//
// A browser-backed renderer serializes this shape as JSON straight out of the
// page; `PageSnapshot::from_html` builds the same table from static markup.

use crate::candidate::BoundingBox;
use crate::error::{Result, ScanError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static STYLE_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)([^{}]+)\{([^{}]*)\}").expect("valid style rule regex"));
static STYLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("valid style selector"));
static BACKGROUND_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*?(url\(\s*['"]?[^'")]+['"]?\s*\))"#)
        .expect("valid background regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomElement {
    pub index: usize,
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Serialized markup, kept for inline `svg` elements only.
    pub outer_html: Option<String>,
    /// Computed `background-image` value, e.g. `url("https://...")`.
    pub computed_background: Option<String>,
    pub bounding_box: Option<BoundingBox>,
    /// Natural pixel size for `img` elements when the renderer knows it.
    pub natural_size: Option<(u32, u32)>,
}

impl DomElement {
    /// Case-insensitive attribute lookup. `href` also matches `xlink:href`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| {
                key.eq_ignore_ascii_case(name)
                    || key
                        .rsplit_once(':')
                        .is_some_and(|(_, local)| local.eq_ignore_ascii_case(name))
            })
            .map(|(_, value)| value.as_str())
    }

    fn non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn class(&self) -> Option<&str> {
        self.non_empty("class")
    }

    pub fn id(&self) -> Option<&str> {
        self.non_empty("id")
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub markup: String,
    pub viewport: Viewport,
    pub elements: Vec<DomElement>,
}

impl PageSnapshot {
    /// Build a snapshot from static markup.
    ///
    /// Geometry is unknown without a layout engine, so bounding boxes stay
    /// empty. Background images declared in `<style>` blocks are applied to
    /// matching elements in source order, which approximates the cascade for
    /// the simple selectors logo markup tends to use.
    pub fn from_html(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut ids = HashMap::new();
        let mut elements: Vec<DomElement> = Vec::new();

        for node in document.root_element().descendants() {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            let index = elements.len();
            ids.insert(el.id(), index);

            let parent = el
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|p| ids.get(&p.id()).copied());
            let tag = el.value().name().to_ascii_lowercase();
            let outer_html = (tag == "svg").then(|| el.html());
            let attributes = el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            elements.push(DomElement {
                index,
                tag,
                attributes,
                parent,
                outer_html,
                ..Default::default()
            });
            if let Some(p) = parent {
                elements[p].children.push(index);
            }
        }

        // Stylesheet backgrounds, later rules overriding earlier ones.
        let stylesheet = document
            .select(&STYLE_SELECTOR)
            .map(|style| style.text().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        for rule in STYLE_RULE_RE.captures_iter(&stylesheet) {
            let Some(decl) = BACKGROUND_DECL_RE.captures(&rule[2]) else {
                continue;
            };
            for selector_text in rule[1].split(',').map(str::trim) {
                let Ok(selector) = Selector::parse(selector_text) else {
                    debug!("Skipping unsupported selector {:?}", selector_text);
                    continue;
                };
                for matched in document.select(&selector) {
                    if let Some(&i) = ids.get(&matched.id()) {
                        elements[i].computed_background = Some(decl[1].to_string());
                    }
                }
            }
        }

        Self {
            url: url.to_string(),
            markup: html.to_string(),
            viewport: Viewport::default(),
            elements,
        }
    }

    /// Parse the element table a browser-side evaluation returns.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScanError::ParseError(e.to_string()))
    }

    pub fn element(&self, index: usize) -> Option<&DomElement> {
        self.elements.get(index)
    }

    pub fn parent_of(&self, index: usize) -> Option<&DomElement> {
        self.element(index)
            .and_then(|el| el.parent)
            .and_then(|p| self.element(p))
    }

    /// Ancestors of `index`, nearest first, excluding the element itself.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = &DomElement> + '_ {
        let mut next = self.element(index).and_then(|el| el.parent);
        std::iter::from_fn(move || {
            let current = self.element(next?)?;
            next = current.parent;
            Some(current)
        })
    }

    /// The element itself or its nearest ancestor with the given tag.
    pub fn closest(&self, index: usize, tag: &str) -> Option<&DomElement> {
        let this = self.element(index)?;
        if this.is(tag) {
            return Some(this);
        }
        self.ancestors(index).find(|el| el.is(tag))
    }

    pub fn element_children(&self, index: usize) -> impl Iterator<Item = &DomElement> + '_ {
        self.element(index)
            .into_iter()
            .flat_map(|el| el.children.iter())
            .filter_map(|&c| self.element(c))
    }

    pub fn elements_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DomElement> + 'a {
        self.elements.iter().filter(move |el| el.is(tag))
    }
}
