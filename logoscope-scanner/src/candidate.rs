use crate::urls;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Discovery channel a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    TagReference,
    InlineVector,
    VectorSpriteReference,
    CssBackground,
    InlineStyleBackground,
    MarkupTextScan,
    SpriteMarkupScan,
    DataAttributeScan,
    FaviconFallback,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TagReference => "tag-reference",
            SourceKind::InlineVector => "inline-vector",
            SourceKind::VectorSpriteReference => "vector-sprite-reference",
            SourceKind::CssBackground => "css-background",
            SourceKind::InlineStyleBackground => "inline-style-background",
            SourceKind::MarkupTextScan => "markup-text-scan",
            SourceKind::SpriteMarkupScan => "sprite-markup-scan",
            SourceKind::DataAttributeScan => "data-attribute-scan",
            SourceKind::FaviconFallback => "favicon-fallback",
        }
    }

    /// Tie-break rank; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            SourceKind::TagReference
            | SourceKind::InlineVector
            | SourceKind::VectorSpriteReference => 5,
            SourceKind::CssBackground => 4,
            SourceKind::InlineStyleBackground => 3,
            SourceKind::MarkupTextScan | SourceKind::SpriteMarkupScan => 2,
            SourceKind::DataAttributeScan => 1,
            SourceKind::FaviconFallback => 0,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            SourceKind::InlineVector | SourceKind::VectorSpriteReference
        )
    }
}

/// Viewport-relative element rectangle captured at harvest time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    pub filename: String,
    pub extension: String,
    pub pathname: String,
    pub domain: String,
    pub source_kind: SourceKind,
    pub alt_text: Option<String>,
    pub css_class: Option<String>,
    pub element_id: Option<String>,
    pub parent_css_class: Option<String>,
    pub parent_element_id: Option<String>,
    pub width: u32,
    pub height: u32,
    pub bounding_box: Option<BoundingBox>,
    pub is_in_header_region: bool,
    pub is_in_navigation_region: bool,
    pub is_in_homepage_anchor: bool,
    pub is_only_child_of_anchor: bool,
    pub is_logo_fragment: bool,
    pub is_favicon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,
}

impl ImageCandidate {
    /// Bare candidate with the url-derived fields filled in.
    pub fn new(url: String, source_kind: SourceKind) -> Self {
        let filename = urls::filename_of(&url);
        let extension = if urls::is_inline_svg(&url) {
            "svg".to_string()
        } else {
            urls::extension_of(&filename)
        };
        let pathname = urls::pathname_of(&url);
        let domain = urls::domain_of(&url);

        Self {
            url,
            filename,
            extension,
            pathname,
            domain,
            source_kind,
            alt_text: None,
            css_class: None,
            element_id: None,
            parent_css_class: None,
            parent_element_id: None,
            width: 0,
            height: 0,
            bounding_box: None,
            is_in_header_region: false,
            is_in_navigation_region: false,
            is_in_homepage_anchor: false,
            is_only_child_of_anchor: false,
            is_logo_fragment: false,
            is_favicon: false,
            score: None,
            byte_size: None,
            saved_path: None,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.source_kind.is_vector()
    }

    /// Only positively scored candidates count as logos.
    pub fn is_viable(&self) -> bool {
        self.score.is_some_and(|s| s > 0)
    }

    pub fn score_or_zero(&self) -> i32 {
        self.score.unwrap_or(0)
    }
}
