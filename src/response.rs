//! Response writing: the request model becomes the JSON payload.

use crate::request::RequestModel;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

/// Serialize every field left in the model with the model's status.
pub fn model_response(model: RequestModel) -> Response {
    let status = model.status();
    (status, Json(model.into_body())).into_response()
}
