// GET /api/stats — catalog size, vector coverage, top genres and tags.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{internal_error, AppState};

pub async fn get_stats(State(state): State<AppState>) -> Response {
    match state.store().catalog_stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error(e, "DB error computing catalog stats"),
    }
}
