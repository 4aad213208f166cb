//! Core types and shared functionality for crawlhtml.
//!
//! This crate provides:
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::{AppConfig, ConfigError, MalformedPolicy};
pub use error::{DetectionError, Error, FetchError};
