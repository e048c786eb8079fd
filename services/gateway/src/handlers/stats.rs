use crate::error::AppError;
use crate::models::{ActivityQuery, UnderwriterListResponse};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use types::record::StatsSnapshot;

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsSnapshot>, AppError> {
    let snapshot = state.service.stats().await?;
    Ok(Json(snapshot))
}

pub async fn list_underwriters(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<UnderwriterListResponse>, AppError> {
    let data = state
        .service
        .underwriter_activity(query.search.as_deref())
        .await?;
    let total = data.len();
    Ok(Json(UnderwriterListResponse { data, total }))
}
