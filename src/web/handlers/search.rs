// GET /api/search?q=&limit= — name search, exact match first.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::web::{api_error, internal_error, AppState};

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
    /// Max results (default 10, max 50)
    pub limit: Option<usize>,
}

pub async fn search_games(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let Some(q) = params.q.filter(|q| !q.trim().is_empty()) else {
        return api_error(StatusCode::BAD_REQUEST, "Missing query parameter 'q'");
    };
    let limit = params.limit.unwrap_or(10).clamp(1, 50);

    match state.store().search_by_name(&q, limit).await {
        Ok(matches) => Json(serde_json::json!({
            "query": q,
            "results": matches,
        }))
        .into_response(),
        Err(e) => internal_error(e, "DB error searching games"),
    }
}
