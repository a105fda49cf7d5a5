pub mod acme;
pub mod globex;

use std::sync::Arc;

use crate::scraping::adapter::SiteAdapter;
use crate::scraping::fetcher::PageFetcher;

pub use acme::AcmeAdapter;
pub use globex::GlobexAdapter;

/// Every site scraped in production. Add new adapters here.
pub fn registry(fetcher: Arc<dyn PageFetcher>) -> Vec<Arc<dyn SiteAdapter>> {
    vec![
        Arc::new(AcmeAdapter::new(fetcher.clone())),
        Arc::new(GlobexAdapter::new(fetcher)),
    ]
}
