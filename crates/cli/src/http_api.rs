use axum::{
    body::Body,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
};
use codedesk_protocol::serialize_json;
use serde::Serialize;

pub(crate) fn build_response<T: Serialize>(
    status: StatusCode,
    response: &T,
) -> Result<Response, StatusCode> {
    let bytes = serialize_json(response)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();

    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub(crate) fn invalid_json_message(err: &serde_json::Error) -> String {
    format!("Invalid JSON request: {err}")
}
