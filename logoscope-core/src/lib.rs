pub mod batch;
pub mod color;
pub mod error;
pub mod extract;
pub mod persist;
pub mod report;

pub use color::{BrandColors, ColorExtractor, ColorPair, PaletteExtractor};
pub use error::CoreError;
pub use extract::{ExtractOptions, LogoExtraction, Pipeline};
pub use report::LogoReport;
