// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    models::{StatusResponse, VehicleUpdate, VehicleView},
    state::AppState,
    storage::VehicleInput,
};

pub mod health;
pub mod vehicle;

pub fn router(state: AppState) -> Router {
    let car_routes = Router::new()
        .route("/create", post(vehicle::create_vehicle))
        .route("/info", get(vehicle::get_vehicle))
        .route("/update", patch(vehicle::update_vehicle));

    let health_routes = Router::new()
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness));

    Router::new()
        .nest("/car", car_routes)
        .nest("/health", health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        vehicle::create_vehicle,
        vehicle::get_vehicle,
        vehicle::update_vehicle,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            VehicleInput,
            VehicleView,
            VehicleUpdate,
            StatusResponse,
            ErrorBody,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Vehicle", description = "Encrypted vehicle record"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
