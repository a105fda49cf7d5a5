pub mod ingest_service;
pub mod scheduler;
pub mod scrape_orchestrator;
