//! Oddsboard: service layer shared by `odds-server` and `scrape-once`.

pub mod http;
pub mod service;

pub use service::ScrapeService;
