//! HTTP surface: htmx fragments for weather, news and the to-do list.

mod cors;
pub mod error;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    Config,
    feed::{NewsFeed, WeatherFeed},
    provider::{self, ForecastProvider, NewsProvider},
    todo::TodoStore,
};

pub use error::AppError;

/// Everything a handler can reach. Owned by the server for the life of the process.
#[derive(Debug, Clone)]
pub struct AppState {
    pub weather: WeatherFeed,
    pub news: NewsFeed,
    pub todos: Arc<TodoStore>,
}

impl AppState {
    pub fn new(
        forecast: Arc<dyn ForecastProvider>,
        news: Arc<dyn NewsProvider>,
        todos: TodoStore,
        config: &Config,
    ) -> Self {
        Self {
            weather: WeatherFeed::new(forecast, &config.forecast),
            news: NewsFeed::new(news, &config.news),
            todos: Arc::new(todos),
        }
    }

    /// Real providers sharing one pooled HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = provider::http_client().context("Failed to build HTTP client")?;
        Ok(Self::new(
            provider::forecast_provider_from_config(config, http.clone()),
            provider::news_provider_from_config(config, http),
            TodoStore::new(),
            config,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/getTodayWeather", get(handlers::today_weather))
        .route("/getFutureWeather", get(handlers::future_weather))
        .route("/getTopNews", get(handlers::top_news))
        .route("/todos", get(handlers::list_todos))
        .route("/todo", post(handlers::create_todo))
        .route(
            "/todo/{id}",
            get(handlers::get_todo)
                .put(handlers::toggle_todo)
                .delete(handlers::delete_todo),
        )
        .route("/todo/{id}/toggle", put(handlers::toggle_todo))
        .layer(middleware::from_fn(cors::cors))
        .with_state(state)
}

pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let listener = TcpListener::bind(config.server.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!("Server is running on http://{}", config.server.bind);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server stopped unexpectedly")
}
