use anyhow::Result;
use std::time::Duration;

use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::{assistant_routes, catalog_routes, log_requests, state::*, ServerConfig};
use crate::agent::AgentHandle;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub albums: usize,
    pub singles: usize,
    pub books: usize,
    pub movies: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let counts = state.catalog_store.counts().unwrap_or_default();
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        albums: counts.albums,
        singles: counts.singles,
        books: counts.books,
        movies: counts.movies,
    };
    Json(stats)
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    agent: Option<AgentHandle>,
) -> Router {
    let state = ServerState::new(config.clone(), catalog_store, agent);

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .merge(catalog_routes(state.clone()))
        .merge(assistant_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    agent: Option<AgentHandle>,
    shutdown: CancellationToken,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, catalog_store, agent);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Album, Single};
    use crate::catalog_store::{CatalogStore, InMemoryCatalogStore};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Utc;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router {
        make_app(
            ServerConfig::default(),
            Arc::new(InMemoryCatalogStore::new()),
            None,
        )
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stats = body_json(response).await;
        assert_eq!(stats["albums"], 0);
        assert!(stats["uptime"].as_str().unwrap().contains('d'));
    }

    #[tokio::test]
    async fn album_crud_flow() {
        let app = test_app();

        let created = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/music",
                serde_json::json!({"title": "Abbey Road", "artist": "The Beatles", "year": 1969}),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let updated = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/music",
                serde_json::json!({"title": "Abbey Road", "artist": "The Beatles", "rating": 5}),
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);

        let listed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/music?artist=beatles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(listed.status(), StatusCode::OK);
        let albums = body_json(listed).await;
        assert_eq!(albums.as_array().unwrap().len(), 1);
        assert_eq!(albums[0]["year"], 1969);
        assert_eq!(albums[0]["rating"], 5);

        let deleted = app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                "/music",
                serde_json::json!({"title": "Abbey Road", "artist": "The Beatles"}),
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let missing = app
            .oneshot(json_request(
                Method::DELETE,
                "/music",
                serde_json::json!({"title": "Abbey Road", "artist": "The Beatles"}),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_without_natural_key_is_rejected() {
        let response = test_app()
            .oneshot(json_request(
                Method::POST,
                "/books",
                serde_json::json!({"title": "Dune"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("books"));
    }

    #[tokio::test]
    async fn single_title_lookup_reports_existence() {
        let store = Arc::new(InMemoryCatalogStore::new());
        store
            .insert_single(&Single {
                title: "Come Together".to_string(),
                artists: vec!["The Beatles".to_string()],
                album: "Abbey Road".to_string(),
                last_modified: Utc::now(),
            })
            .unwrap();
        let app = make_app(ServerConfig::default(), store, None);

        let found = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/single?title=come+together")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(found).await, serde_json::json!({"exists": true}));

        let not_found = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/single?title=yesterday")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            body_json(not_found).await,
            serde_json::json!({"exists": false})
        );

        // Without a title the handler returns the matching records.
        let listed = app
            .oneshot(
                Request::builder()
                    .uri("/single?album=abbey")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let singles = body_json(listed).await;
        assert_eq!(singles.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_query_params_are_ignored() {
        let store = Arc::new(InMemoryCatalogStore::new());
        store
            .upsert_album(&Album {
                title: "Kind of Blue".to_string(),
                artist: "Miles Davis".to_string(),
                ..Default::default()
            })
            .unwrap();
        let app = make_app(ServerConfig::default(), store, None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/music?title=&year=notanumber")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let albums = body_json(response).await;
        assert_eq!(albums.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assistant_is_unavailable_when_disabled() {
        let response = test_app()
            .oneshot(json_request(
                Method::POST,
                "/assistant",
                serde_json::json!({"question": "what did I pin last week?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
