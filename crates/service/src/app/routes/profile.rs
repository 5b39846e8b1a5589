use axum::{response::IntoResponse, Json};

use crate::context::CurrentIdentity;

pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(identity.as_ref().clone())
}
