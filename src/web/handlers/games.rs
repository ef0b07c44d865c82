// Game detail handlers.
//
// GET /api/games/{appid}             — catalog record plus store listing
// GET /api/games/{appid}/preferences — what a user could filter on

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::GameId;
use crate::web::{api_error, internal_error, AppState};

pub async fn get_game(State(state): State<AppState>, Path(appid): Path<GameId>) -> Response {
    match state.recommender.game_details(appid).await {
        Ok(Some(details)) => Json(details).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Game not found"),
        Err(e) => internal_error(e, "DB error fetching game"),
    }
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Path(appid): Path<GameId>,
) -> Response {
    match state.recommender.available_preferences(appid).await {
        Ok(Some(options)) => Json(options).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Game not found"),
        Err(e) => internal_error(e, "DB error fetching preference options"),
    }
}
