pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Namespace tree
        .route(
            "/api/organizations/{org_id}/tree",
            get(routes::tree::get_tree).delete(routes::tree::delete_tree),
        )
        .route(
            "/api/organizations/{org_id}/tree/move",
            get(routes::tree::move_tree),
        )
        .route(
            "/api/organizations/{org_id}/tree/duplicate",
            get(routes::tree::duplicate_tree),
        )
        .route(
            "/api/organizations/{org_id}/tree/enable",
            get(routes::tree::enable_tree),
        )
        .route(
            "/api/organizations/{org_id}/tree/disable",
            get(routes::tree::disable_tree),
        )
        .route(
            "/api/organizations/{org_id}/tree/export",
            get(routes::tree::export_tree),
        )
        .route(
            "/api/organizations/{org_id}/tree/import",
            post(routes::tree::import_tree),
        )
        // Events
        .route(
            "/api/organizations/{org_id}/event",
            post(routes::events::post_event).get(routes::events::list_events),
        )
        .route(
            "/api/organizations/{org_id}/event/{event_id}/sse",
            get(routes::events::sse_event_detail),
        )
        // Storage
        .route(
            "/api/organizations/{org_id}/storage",
            post(routes::storage::upsert_storage).get(routes::storage::list_storage),
        )
        .route(
            "/api/organizations/{org_id}/storage/{key}",
            delete(routes::storage::delete_storage),
        )
        .route(
            "/api/organizations/{org_id}/storage/sse",
            get(routes::storage::sse_storage),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the triggerdeck API server.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(app_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("triggerdeck API listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
