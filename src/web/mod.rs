// Web server — Axum-based JSON API over the recommendation engine.
//
// Every route serves JSON. Unknown games are 404, store failures are 500
// with the details logged server-side only. A recommendation request that
// finds nothing is still a 200 with an empty list.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::CatalogStore;
use crate::engine::Recommender;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, config: Config) -> Self {
        Self {
            recommender: Arc::new(Recommender::new(store)),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        self.recommender.store()
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(
    store: Arc<dyn CatalogStore>,
    config: Config,
    bind: &str,
    port: u16,
) -> Result<()> {
    let app = build_router(AppState::new(store, config));

    let addr = format!("{bind}:{port}");
    info!("Kindred API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/search", get(handlers::search::search_games))
        .route("/api/games/{appid}", get(handlers::games::get_game))
        .route(
            "/api/games/{appid}/preferences",
            get(handlers::games::get_preferences),
        )
        .route(
            "/api/games/{appid}/recommendations",
            post(handlers::recommendations::recommend),
        )
        .route("/api/stats", get(handlers::stats::get_stats));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check. Always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// Log a store failure and turn it into a generic 500.
pub fn internal_error(err: anyhow::Error, context: &str) -> Response {
    tracing::error!(error = %err, "{context}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use indicatif::ProgressBar;
    use rusqlite::Connection;
    use tower::ServiceExt;

    use crate::db::import::{import_entries, parse_catalog};
    use crate::db::schema::create_tables;
    use crate::db::sqlite::SqliteCatalog;

    const CATALOG: &str = r#"[
        {"steam_appid": 367520, "name": "Hollow Knight",
         "main_genre": "Action", "sub_genre": "Platformer", "sub_sub_genre": "Metroidvania",
         "unique_tags": ["charm-builds"], "steam_tags": ["Metroidvania", "Exploration"]},
        {"steam_appid": 1145360, "name": "Hades",
         "main_genre": "Action", "sub_genre": "Roguelike", "sub_sub_genre": "Dungeon Crawler",
         "unique_tags": ["boon-builds"], "steam_tags": ["Roguelike"],
         "listing": {"pricing": "$24.99"}},
        {"steam_appid": 268910, "name": "Cuphead",
         "main_genre": "Action", "sub_genre": "Platformer", "sub_sub_genre": "Run and Gun",
         "unique_tags": ["boss-rush"]},
        {"steam_appid": 413150, "name": "Stardew Valley",
         "main_genre": "Simulation", "sub_genre": "Farming", "sub_sub_genre": "Life Sim"}
    ]"#;

    fn test_app() -> Router {
        let mut conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        import_entries(&mut conn, parse_catalog(CATALOG).unwrap(), &ProgressBar::hidden()).unwrap();
        let config = Config {
            db_path: ":memory:".to_string(),
            default_limit: 10,
            bind: "127.0.0.1".to_string(),
            port: 5000,
        };
        build_router(AppState::new(Arc::new(SqliteCatalog::new(conn)), config))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(test_app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_game_detail_uses_listing_fallback() {
        let (status, json) = send(test_app(), get("/api/games/367520")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Hollow Knight");
        assert_eq!(json["pricing"], "Unknown");
        assert_eq!(json["header_image"], "/static/logo.png");

        let (_, json) = send(test_app(), get("/api/games/1145360")).await;
        assert_eq!(json["pricing"], "$24.99");
    }

    #[tokio::test]
    async fn test_unknown_game_is_404() {
        let (status, json) = send(test_app(), get("/api/games/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Game not found");

        let (status, _) = send(
            test_app(),
            post_json("/api/games/999/recommendations", serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (status, _) = send(test_app(), get("/api/search")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(test_app(), get("/api/search?q=hollow%20knight")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["results"][0]["steam_appid"], 367520);
        assert_eq!(json["results"][0]["kind"], "exact");
    }

    #[tokio::test]
    async fn test_recommendations_with_preferences() {
        let body = serde_json::json!({
            "preferences": {"preferred_steam_tags": ["Roguelike"]},
            "limit": 5
        });
        let (status, json) = send(
            test_app(),
            post_json("/api/games/367520/recommendations", body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let recs = json["recommendations"].as_array().unwrap();
        // Cuphead (sub, 0.25) and Hades (main, 0.15 + 0.25 steam-tag bonus).
        // Stardew Valley is a different main genre.
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["steam_appid"], 1145360);
        assert_eq!(recs[0]["match_type"], "main");
        assert!((recs[0]["preference_bonus"].as_f64().unwrap() - 0.25).abs() < 1e-9);
        assert_eq!(recs[0]["game"]["pricing"], "$24.99");
        assert_eq!(recs[1]["steam_appid"], 268910);
        assert_eq!(recs[1]["match_type"], "sub");
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn test_recommendations_empty_body_and_no_candidates() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/games/413150/recommendations")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(test_app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 0);
        assert_eq!(json["message"], "no similar games found");
    }

    #[tokio::test]
    async fn test_recommendations_rejects_bad_limit() {
        let (status, _) = send(
            test_app(),
            post_json(
                "/api/games/367520/recommendations",
                serde_json::json!({"limit": 0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats() {
        let (status, json) = send(test_app(), get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_games"], 4);
        assert_eq!(json["total_vectors"], 0);
    }
}
