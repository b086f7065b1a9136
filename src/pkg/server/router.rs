use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{Router, routing::get};

use super::handlers::auth::get_user;
use super::handlers::jobs;
use super::handlers::probes::{health, healthz, livez};
use super::middlewares::authn;
use super::state::AppState;

pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/rpc/jobs.create", post(jobs::create))
        .route("/rpc/jobs.getMyJobs", get(jobs::get_my_jobs))
        .route("/rpc/jobs.update", post(jobs::update))
        .route("/rpc/jobs.delete", post(jobs::delete))
        .route("/rpc/auth.getUser", get(get_user))
        .layer(from_fn_with_state(state.clone(), authn::authenticate))
        .route("/rpc/jobs.getAll", get(jobs::get_all))
        .route("/rpc/jobs.getById", get(jobs::get_by_id))
        .route("/rpc/health", get(health))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .with_state(state)
}
