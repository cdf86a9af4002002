pub mod candidate;
pub mod error;
pub mod favicon;
pub mod harvest;
pub mod page;
pub mod rank;
pub mod render;
pub mod score;
pub mod tables;
pub mod urls;

pub use candidate::{BoundingBox, ImageCandidate, SourceKind};
pub use error::ScanError;
pub use favicon::{favicon_candidate, find_favicon};
pub use harvest::harvest;
pub use page::{DomElement, PageSnapshot, Viewport};
pub use rank::{rank, select_top};
pub use render::{HttpRenderer, Renderer, TierConfig, WaitTier};
pub use score::SiteContext;
pub use tables::KeywordTables;
