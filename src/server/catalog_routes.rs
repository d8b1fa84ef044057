//! CRUD handlers for the catalog collections.
//!
//! Reads translate query parameters through a [`FilterBuilder`]; writes go
//! by natural key and require its fields to be present. All responses are
//! JSON, with `{"message": ...}` on success and `{"error": ...}` on failure.

use super::state::GuardedCatalogStore;
use crate::catalog::{Album, Book, CatalogRecord, Movie, Single};
use crate::catalog_store::UpsertOutcome;
use crate::query::{FilterBuilder, QueryParams};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use super::state::ServerState;

pub fn catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route(
            "/music",
            get(get_albums).post(post_album).delete(delete_album),
        )
        .route(
            "/books",
            get(get_books).post(post_book).delete(delete_book),
        )
        .route(
            "/movies",
            get(get_movies).post(post_movie).delete(delete_movie),
        )
        .route(
            "/single",
            get(get_singles).post(post_single).delete(delete_single),
        )
        .with_state(state)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({"message": text}))).into_response()
}

fn error_response(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({"error": text}))).into_response()
}

fn internal_error(err: anyhow::Error) -> Response {
    error!("Catalog request failed: {:#}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn missing_key_response<T: CatalogRecord>() -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("missing identifying fields for {}", T::COLLECTION),
    )
}

fn upsert_response(outcome: UpsertOutcome) -> Response {
    match outcome {
        UpsertOutcome::Created => message(StatusCode::CREATED, "created"),
        UpsertOutcome::Updated => message(StatusCode::OK, "updated"),
        UpsertOutcome::Unchanged => message(StatusCode::OK, "unchanged"),
    }
}

fn delete_response(removed: bool) -> Response {
    if removed {
        message(StatusCode::OK, "deleted")
    } else {
        error_response(StatusCode::NOT_FOUND, "not found")
    }
}

/// Shared filter shape for albums, books and movies; `person` names the
/// collection's creator field (artist, author or director).
fn shelf_filter(params: &QueryParams, person: &str) -> FilterBuilder {
    FilterBuilder::new()
        .with_string_field(params, "title")
        .with_string_field(params, person)
        .with_string_field(params, "genre")
        .with_string_field(params, "comment")
        .with_int_field(params, "year")
        .with_int_field(params, "rating")
}

async fn get_albums(
    State(store): State<GuardedCatalogStore>,
    Query(params): Query<QueryParams>,
) -> Response {
    let filter = shelf_filter(&params, "artist")
        .with_array_field(&params, "cuts")
        .build();
    match store.find_albums(&filter) {
        Ok(albums) => Json(albums).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn post_album(
    State(store): State<GuardedCatalogStore>,
    Json(album): Json<Album>,
) -> Response {
    if !album.has_natural_key() {
        return missing_key_response::<Album>();
    }
    match store.upsert_album(&album) {
        Ok(outcome) => upsert_response(outcome),
        Err(err) => internal_error(err),
    }
}

async fn delete_album(
    State(store): State<GuardedCatalogStore>,
    Json(album): Json<Album>,
) -> Response {
    if !album.has_natural_key() {
        return missing_key_response::<Album>();
    }
    match store.delete_album(&album) {
        Ok(removed) => delete_response(removed),
        Err(err) => internal_error(err),
    }
}

async fn get_books(
    State(store): State<GuardedCatalogStore>,
    Query(params): Query<QueryParams>,
) -> Response {
    let filter = shelf_filter(&params, "author").build();
    match store.find_books(&filter) {
        Ok(books) => Json(books).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn post_book(State(store): State<GuardedCatalogStore>, Json(book): Json<Book>) -> Response {
    if !book.has_natural_key() {
        return missing_key_response::<Book>();
    }
    match store.upsert_book(&book) {
        Ok(outcome) => upsert_response(outcome),
        Err(err) => internal_error(err),
    }
}

async fn delete_book(State(store): State<GuardedCatalogStore>, Json(book): Json<Book>) -> Response {
    if !book.has_natural_key() {
        return missing_key_response::<Book>();
    }
    match store.delete_book(&book) {
        Ok(removed) => delete_response(removed),
        Err(err) => internal_error(err),
    }
}

async fn get_movies(
    State(store): State<GuardedCatalogStore>,
    Query(params): Query<QueryParams>,
) -> Response {
    let filter = shelf_filter(&params, "director").build();
    match store.find_movies(&filter) {
        Ok(movies) => Json(movies).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn post_movie(
    State(store): State<GuardedCatalogStore>,
    Json(movie): Json<Movie>,
) -> Response {
    if !movie.has_natural_key() {
        return missing_key_response::<Movie>();
    }
    match store.upsert_movie(&movie) {
        Ok(outcome) => upsert_response(outcome),
        Err(err) => internal_error(err),
    }
}

async fn delete_movie(
    State(store): State<GuardedCatalogStore>,
    Json(movie): Json<Movie>,
) -> Response {
    if !movie.has_natural_key() {
        return missing_key_response::<Movie>();
    }
    match store.delete_movie(&movie) {
        Ok(removed) => delete_response(removed),
        Err(err) => internal_error(err),
    }
}

/// Singles lookups double as an existence probe: when the caller pinned the
/// search to a title, the answer is just whether that single is there.
async fn get_singles(
    State(store): State<GuardedCatalogStore>,
    Query(params): Query<QueryParams>,
) -> Response {
    let filter = FilterBuilder::new()
        .with_string_field(&params, "title")
        .with_string_field(&params, "album")
        .with_array_field(&params, "artists")
        .build();
    let probe_by_title = filter.get("title").is_some();

    match store.find_singles(&filter) {
        Ok(singles) if probe_by_title => {
            Json(json!({"exists": !singles.is_empty()})).into_response()
        }
        Ok(singles) => Json(singles).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn post_single(
    State(store): State<GuardedCatalogStore>,
    Json(mut single): Json<Single>,
) -> Response {
    if !single.has_natural_key() {
        return missing_key_response::<Single>();
    }
    single.last_modified = Utc::now();
    match store.insert_single(&single) {
        Ok(UpsertOutcome::Created) => message(StatusCode::CREATED, "created"),
        Ok(_) => message(StatusCode::OK, "already present"),
        Err(err) => internal_error(err),
    }
}

async fn delete_single(
    State(store): State<GuardedCatalogStore>,
    Json(single): Json<Single>,
) -> Response {
    if !single.has_natural_key() {
        return missing_key_response::<Single>();
    }
    match store.delete_single(&single) {
        Ok(removed) => delete_response(removed),
        Err(err) => internal_error(err),
    }
}
