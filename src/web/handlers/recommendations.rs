// POST /api/games/{appid}/recommendations
//
// Body (all optional, may be empty): { "preferences": {...}, "limit": 10 }
//
// The target is resolved first so an unknown app id is a 404 rather than
// an empty list.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::GameId;
use crate::engine::UserPreferences;
use crate::web::{api_error, internal_error, AppState};

/// Upper bound on a single request's limit.
const MAX_LIMIT: usize = 50;

#[derive(Deserialize, Default)]
pub struct RecommendRequest {
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn recommend(
    State(state): State<AppState>,
    Path(appid): Path<GameId>,
    body: Bytes,
) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(e) => {
            return api_error(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}"))
        }
    };
    let limit = request.limit.unwrap_or(state.config.default_limit);
    if limit == 0 || limit > MAX_LIMIT {
        return api_error(
            StatusCode::BAD_REQUEST,
            &format!("limit must be between 1 and {MAX_LIMIT}"),
        );
    }

    let target = match state.store().get_game(appid).await {
        Ok(Some(game)) => game,
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "Game not found"),
        Err(e) => return internal_error(e, "DB error fetching target game"),
    };

    let recs = match state
        .recommender
        .recommend_detailed(appid, request.preferences.as_ref(), limit)
        .await
    {
        Ok(recs) => recs,
        Err(e) => return internal_error(e, "Recommendation failed"),
    };

    let empty = recs.is_empty();
    let mut body = serde_json::json!({
        "target": {
            "steam_appid": target.steam_appid,
            "name": target.name,
            "hierarchy": target.hierarchy,
        },
        "recommendations": recs,
    });
    if empty {
        body["message"] = serde_json::json!("no similar games found");
    }
    Json(body).into_response()
}

/// An empty body means "no preferences, default limit".
fn parse_request(body: &[u8]) -> serde_json::Result<RecommendRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecommendRequest::default());
    }
    serde_json::from_slice(body)
}
