// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vehicle record endpoints.
//!
//! Store operations block (key derivation, file I/O), so every handler hands
//! them to the blocking thread pool.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use crate::{
    error::{ApiError, ErrorBody},
    models::{StatusResponse, VehicleUpdate, VehicleView},
    state::AppState,
    storage::{StoreResult, VehicleInput, VehicleStore},
};

async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&VehicleStore) -> StoreResult<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Vehicle store task failed");
            ApiError::internal("Internal storage error")
        })?
        .map_err(ApiError::from)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

#[utoipa::path(
    post,
    path = "/car/create",
    request_body = VehicleInput,
    tag = "Vehicle",
    responses(
        (status = 201, description = "Record created", body = StatusResponse),
        (status = 400, description = "Invalid vehicle data", body = ErrorBody),
        (status = 409, description = "A record already exists", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    body: Result<Json<VehicleInput>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let input = json_body(body)?;
    run_blocking(&state, move |store| store.create(&input)).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::new("File created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/car/info",
    tag = "Vehicle",
    responses(
        (status = 200, description = "Stored record, passphrase masked", body = VehicleView),
        (status = 404, description = "No record stored", body = ErrorBody),
        (status = 500, description = "Corrupt envelope or storage failure", body = ErrorBody)
    )
)]
pub async fn get_vehicle(State(state): State<AppState>) -> Result<Json<VehicleView>, ApiError> {
    let record = run_blocking(&state, |store| store.read()).await?;
    Ok(Json(VehicleView::from(&record)))
}

#[utoipa::path(
    patch,
    path = "/car/update",
    request_body = VehicleUpdate,
    tag = "Vehicle",
    responses(
        (status = 200, description = "Record updated", body = StatusResponse),
        (status = 400, description = "Invalid field value", body = ErrorBody),
        (status = 403, description = "Field may not be modified", body = ErrorBody),
        (status = 404, description = "No record stored", body = ErrorBody),
        (status = 500, description = "Corrupt envelope or storage failure", body = ErrorBody)
    )
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let payload = json_body(body)?;
    run_blocking(&state, move |store| store.update(&payload)).await?;
    Ok(Json(StatusResponse::new("Update successful")))
}
