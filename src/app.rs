use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/vehicles", get(handlers::vehicles))
        .route("/vehicles/filter", get(handlers::filter_vehicles))
        .route("/vehicles/new", get(handlers::new_vehicle))
        .route("/vehicles/save", post(handlers::save_vehicle))
        .route("/vehicles/:plate", get(handlers::vehicle_details))
        .route("/vehicles/:plate/edit", get(handlers::edit_vehicle))
        .route("/stays", get(handlers::stays))
        .route("/stays/filter", get(handlers::filter_stays))
        .route("/stays/new", get(handlers::new_stay))
        .route("/stays/save", post(handlers::save_stay))
        .route("/stays/:id", get(handlers::stay_details))
        .route("/stays/:id/edit", get(handlers::edit_stay))
        .route("/stays/:id/finish", post(handlers::finish_stay))
        .route("/reports", get(handlers::reports))
        .route("/api/status", get(handlers::api_status))
        .route("/api/summary", get(handlers::api_summary))
        .route("/api/report", get(handlers::api_report))
        .with_state(state)
}
