//! Clients for the analysis backend

pub mod http;

pub use http::HttpBackend;
