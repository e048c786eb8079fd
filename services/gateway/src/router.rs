use crate::handlers::{records, stats};
use crate::models::MessageResponse;
use crate::state::AppState;
use axum::{routing::get, routing::post, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/records",
            get(records::list_records).post(records::create_record),
        )
        .route("/records/bulk", post(records::bulk_upload))
        .route(
            "/records/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/stats", get(stats::get_stats))
        .route("/underwriters", get(stats::list_underwriters))
        .route("/health", get(health));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ok".to_string(),
    })
}
