use std::sync::Arc;

use axum::{Extension, Json};

use crate::pkg::internal::auth::Caller;

pub async fn get_user(Extension(caller): Extension<Arc<Caller>>) -> Json<Caller> {
    Json(Caller::clone(&caller))
}
