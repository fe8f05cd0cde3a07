pub mod dataset;
pub mod error;
pub mod frequency;
pub mod metadata;
pub mod report;
pub mod scraper;
pub mod series;

pub use dataset::{COUNT_COLUMN, Dataset, assemble};
pub use error::CounterError;
pub use frequency::Frequency;
pub use metadata::SiteMetadata;
pub use scraper::{CounterScraper, resolve_range};
pub use series::{Record, Series, build_series};
