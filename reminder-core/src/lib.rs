//! Core library for the weather reminder backend.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Forecast and news providers plus the transforms applied to their output
//! - A freshness-aware response cache and the feeds built on it
//! - HTML fragment rendering and the HTTP server that serves it
//!
//! It is used by `reminder-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod freshness;
pub mod model;
pub mod provider;
pub mod render;
pub mod server;
pub mod todo;
pub mod transform;

pub use config::{Config, ForecastConfig, NewsConfig, ProviderConfig, ServerConfig};
pub use error::UpstreamError;
pub use feed::{NewsFeed, WeatherFeed};
pub use model::{ForecastRecord, NewsArticle, RawObservation, Todo};
pub use provider::{ForecastProvider, NewsProvider, ProviderId};
pub use server::AppState;
