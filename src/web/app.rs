use std::time::Duration;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_ambulance, create_entry, delete_ambulance, delete_entry, get_ambulance, get_entry,
    healthcheck, list_entries, update_entry,
};
use crate::core::Cancellation;
use crate::service::{AmbulanceService, WaitingListService};

#[derive(Clone)]
pub struct AppState {
    pub waiting_list: WaitingListService,
    pub ambulances: AmbulanceService,
    /// Cancelled on shutdown; every in-flight update observes it.
    pub shutdown: Cancellation,
}

impl AppState {
    pub fn new(waiting_list: WaitingListService, ambulances: AmbulanceService) -> Self {
        Self {
            waiting_list,
            ambulances,
            shutdown: Cancellation::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route(
            "/api/waiting-list/:ambulance_id/entries",
            get(list_entries).post(create_entry),
        )
        .route(
            "/api/waiting-list/:ambulance_id/entries/:entry_id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/ambulance", post(create_ambulance))
        .route(
            "/api/ambulance/:ambulance_id",
            get(get_ambulance).delete(delete_ambulance),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::PUT,
                    Method::POST,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([header::ORIGIN, header::AUTHORIZATION, header::CONTENT_TYPE])
                .max_age(Duration::from_secs(12 * 60 * 60)),
        )
        .with_state(state)
}
