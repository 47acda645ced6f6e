//! Exchange Transport Infrastructure
//!
//! HTTP adapter for the single exchange endpoint. Sends envelope documents
//! with a fixed media type, applies bounded retry with exponential backoff,
//! and classifies outcomes by transport status alone - business semantics
//! stay with the response validator.

pub mod client;
pub mod config;
pub mod retry;

pub use client::{HttpExchangeTransport, MEDIA_TYPE};
pub use config::ExchangeConfig;
