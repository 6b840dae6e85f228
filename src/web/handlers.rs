use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

use super::Result;
use super::app::AppState;
use crate::model::{
    Ambulance, EntryPatchRequest, NewAmbulanceRequest, NewEntryRequest, WaitingListEntry,
};

pub async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Path(ambulance_id): Path<String>,
) -> Result<Json<Vec<WaitingListEntry>>> {
    let cancel = state.shutdown.clone();
    let entries = state
        .waiting_list
        .list_entries(&ambulance_id, &cancel)
        .await?;
    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Path(ambulance_id): Path<String>,
    payload: std::result::Result<Json<NewEntryRequest>, JsonRejection>,
) -> Result<Json<WaitingListEntry>> {
    let Json(request) = payload?;
    let cancel = state.shutdown.clone();
    let created = state
        .waiting_list
        .create_entry(&ambulance_id, request, &cancel)
        .await?;
    Ok(Json(created))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path((ambulance_id, entry_id)): Path<(String, String)>,
) -> Result<Json<WaitingListEntry>> {
    let cancel = state.shutdown.clone();
    let entry = state
        .waiting_list
        .get_entry(&ambulance_id, &entry_id, &cancel)
        .await?;
    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path((ambulance_id, entry_id)): Path<(String, String)>,
    payload: std::result::Result<Json<EntryPatchRequest>, JsonRejection>,
) -> Result<Json<WaitingListEntry>> {
    let Json(patch) = payload?;
    let cancel = state.shutdown.clone();
    let updated = state
        .waiting_list
        .update_entry(&ambulance_id, &entry_id, patch, &cancel)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path((ambulance_id, entry_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let cancel = state.shutdown.clone();
    state
        .waiting_list
        .delete_entry(&ambulance_id, &entry_id, &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_ambulance(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewAmbulanceRequest>, JsonRejection>,
) -> Result<Json<Ambulance>> {
    let Json(request) = payload?;
    Ok(Json(state.ambulances.create(request).await?))
}

pub async fn get_ambulance(
    State(state): State<AppState>,
    Path(ambulance_id): Path<String>,
) -> Result<Json<Ambulance>> {
    Ok(Json(state.ambulances.get(&ambulance_id).await?))
}

pub async fn delete_ambulance(
    State(state): State<AppState>,
    Path(ambulance_id): Path<String>,
) -> Result<StatusCode> {
    state.ambulances.delete(&ambulance_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
