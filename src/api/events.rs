use axum::{debug_handler, extract::State, http::StatusCode, Json};
use log::error;
use serde::Deserialize;
use serde_json::{json, value::RawValue, Value};

use super::{error::AppError, AppState};

#[derive(Deserialize)]
struct EventKey {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Partition key for a posted event: its `userId` when that is a string.
fn event_key(body: &RawValue) -> Option<String> {
    serde_json::from_str::<EventKey>(body.get())
        .ok()
        .and_then(|key| key.user_id)
}

fn is_object(body: &RawValue) -> bool {
    body.get().trim_start().starts_with('{')
}

/// Publishes the posted JSON object to the view topic unchanged.
#[debug_handler]
pub async fn publish_view(
    State(s): State<AppState>,
    Json(body): Json<Box<RawValue>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if !is_object(&body) {
        return Err(AppError::BadRequest("Event must be a JSON object"));
    }
    let key = event_key(&body);
    s.publisher
        .publish(key, body.get().as_bytes().to_vec())
        .await
        .map_err(|e| {
            error!("Failed to send event to Kafka: {:#}", e);
            AppError::InternalServerError
        })?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Event accepted" })),
    ))
}
