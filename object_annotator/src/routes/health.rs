use axum::response::Json;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Status {
    status: String,
}

pub async fn healthcheck() -> Json<Status> {
    Json(Status {
        status: "Available".into(),
    })
}
