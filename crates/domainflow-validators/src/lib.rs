//! DNS Validator and HTTP Keyword Validator worker handlers (§4.7, §4.8).

pub mod dns;
pub mod http;
pub mod rate_limit;

pub use dns::DnsValidator;
pub use http::HttpKeywordValidator;
pub use rate_limit::TokenBucket;
