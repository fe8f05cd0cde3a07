pub mod error;
pub mod extractor;
pub mod fetch;
pub mod locator;
pub mod normalize;
pub mod payload;
pub mod site;

pub use error::ScanError;
pub use fetch::{HttpFetcher, PageFetcher};
pub use payload::{
    DirectionSeries, EmbeddedPayload, Extraction, GeoPoint, SiteIdentity, Timestamp,
    parse_timestamp,
};
pub use site::{CounterSiteSource, EcoDisplayMap, PageQuery};
