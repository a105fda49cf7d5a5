pub mod adapter;
pub mod adapters;
pub mod extract;
pub mod fetcher;

pub use adapter::{AdapterStage, ScrapeBatch, SiteAdapter};
pub use fetcher::{HttpFetcher, PageFetcher};
