use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use super::{AppState, error::AppError};
use crate::{model::Todo, render};

pub async fn today_weather(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let records = state.weather.records().await.map_err(AppError::weather)?;
    let (today, preview) = render::select_today(&records, Local::now().naive_local());
    Ok(Html(render::render_today(&today, &preview)))
}

pub async fn future_weather(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let records = state.weather.records().await.map_err(AppError::weather)?;
    let days = render::select_future(&records, Local::now().naive_local());
    Ok(Html(render::render_future(&days)))
}

pub async fn top_news(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let articles = state.news.articles().await.map_err(AppError::news)?;
    Ok(Html(render::render_news(&articles)))
}

pub async fn list_todos(State(state): State<AppState>) -> Html<String> {
    Html(render::render_todos(&state.todos.list().await))
}

fn parse_id(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid todo id"))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_id(&id)?;
    state.todos.get(id).await.map(Json).ok_or(AppError::NotFound)
}

#[derive(Debug, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    title: String,
}

pub async fn create_todo(
    State(state): State<AppState>,
    form: Result<Form<NewTodo>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    // A body that is not a form at all has no title either.
    let Form(form) = form.map_err(|_| AppError::BadRequest("Title is required"))?;
    let title = form.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required"));
    }

    let todo = state.todos.create(title.to_string()).await;
    info!(id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Html(render::render_todo(&todo))))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id)?;
    let todo = state.todos.toggle(id).await.ok_or(AppError::NotFound)?;
    Ok(Html(render::render_todo(&todo)))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.todos.delete(id).await.ok_or(AppError::NotFound)?;
    info!(id, "todo deleted");
    Ok(StatusCode::OK)
}
