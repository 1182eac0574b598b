pub(crate) mod page_fetcher;

pub use page_fetcher::{HttpFetcher, PageFetcher, ACCEPT_HTML, ACCEPT_JSON};
