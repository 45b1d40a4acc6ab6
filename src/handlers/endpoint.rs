//! The one handler behind every `/:application/:endpoint` route: build the request
//! model, run the endpoint's chain, write the model back.

use crate::error::AppError;
use crate::extractors::RequestHeaders;
use crate::request::{RequestModel, Verb};
use crate::response::model_response;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Query, Request, State},
    http::header::CONTENT_TYPE,
    response::Response,
    Form,
};

pub async fn dispatch(
    State(state): State<AppState>,
    Path((application, route)): Path<(String, String)>,
    RequestHeaders(headers): RequestHeaders,
    request: Request,
) -> Result<Response, AppError> {
    let endpoint = state.applications.endpoint(&application, &route)?;
    let verb = Verb::parse(request.method().as_str())?;
    let mut model = build_model(verb, headers, request, &state).await?;

    tracing::info!(
        application = %application,
        endpoint = endpoint.name(),
        intent = ?model.intent(),
        "dispatch"
    );
    endpoint.execute(&mut model, &state.runtime).await?;
    Ok(model_response(model))
}

async fn build_model(
    verb: Verb,
    headers: Vec<(String, String)>,
    request: Request,
    state: &AppState,
) -> Result<RequestModel, AppError> {
    if verb.reads_query() {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(RequestModel::from_query(verb, pairs, headers));
    }

    if is_form(&request) {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(RequestModel::from_form(verb, pairs, headers));
    }

    let body = Bytes::from_request(request, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    RequestModel::from_json(verb, &body, headers)
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
