use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all PragmaDB endpoints.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(handler::info_handler))
        .route(
            "/collections",
            get(handler::list_collections).post(handler::create_collection),
        )
        .route("/collections/:name", delete(handler::delete_collection))
        .route(
            "/collections/:name/docs",
            get(handler::list_documents).post(handler::create_document),
        )
        .route(
            "/collections/:name/docs/:id",
            get(handler::get_document)
                .put(handler::update_document)
                .delete(handler::delete_document),
        )
        .route("/collections/:name/export", get(handler::export_collection))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
