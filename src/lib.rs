//! Rust client for the JewelMusic API.
//!
//! The [`webhooks`] module holds the signature check that gates every inbound
//! delivery; [`JewelMusic`] talks to the REST API.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod webhooks;

pub use client::{JewelMusic, PingResponse};
pub use config::{ClientConfig, Environment};
pub use error::{ApiErrorInfo, Error, Result};
