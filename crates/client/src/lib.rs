//! Client code for crawlhtml.
//!
//! This crate provides the HTTP fetch layer, charset detection and
//! transcoding to UTF-8, and the [`Crawler`] that composes them.

pub mod charset;
pub mod crawler;
pub mod fetch;

pub use charset::{DetectedCharset, DetectionSource, HtmlDetector, HtmlReader, TranscodingReader, resolve};
pub use crawler::Crawler;
pub use fetch::{FetchRequest, FetchResponse, ReqwestTransport, Transport, TransportConfig};
