pub mod aggregate;
pub mod assembler;
pub mod discovery;
pub mod fetcher;
pub mod fields;
pub mod models;
pub mod patterns;
pub mod plans;
pub mod strategy;

pub use assembler::{run_batch, BatchSummary, ListingAssembler};
pub use discovery::{filter_valid_links, harvest_links, is_valid_link, LinkDiscovery};
pub use fetcher::{ArchivingFetcher, HttpFetcher, PageFetcher, RenderedDocument};
pub use models::ListingRecord;
