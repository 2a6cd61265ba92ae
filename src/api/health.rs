use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    message: String,
}

impl HealthResponse {
    pub fn new(status: String, message: String) -> Self {
        Self { status, message }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::new(
        "ok".to_string(),
        "Backend is running!".to_string(),
    ))
}
