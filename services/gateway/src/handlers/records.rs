use crate::error::AppError;
use crate::models::{BulkUploadRequest, ListQuery, MessageResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use types::record::{
    BulkReport, GroupedRecordCreate, GroupedRecordUpdate, GroupedStockRecord, ListResponse,
};

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let listing = state
        .service
        .list(query.search.as_deref(), query.limit, query.offset)
        .await?;
    Ok(Json(listing))
}

pub async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<GroupedRecordCreate>,
) -> Result<(StatusCode, Json<GroupedStockRecord>), AppError> {
    let record = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GroupedStockRecord>, AppError> {
    let record = state.service.get(&id).await?;
    Ok(Json(record))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<GroupedRecordUpdate>,
) -> Result<Json<GroupedStockRecord>, AppError> {
    let record = state.service.update(&id, payload).await?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Record deleted".to_string(),
    }))
}

pub async fn bulk_upload(
    State(state): State<AppState>,
    Json(payload): Json<BulkUploadRequest>,
) -> Result<Json<BulkReport>, AppError> {
    let report = state.service.bulk_upsert(payload.data).await?;
    Ok(Json(report))
}
