pub mod http;
pub mod log;
pub mod rate_limit;
