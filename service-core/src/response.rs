//! Response envelope shared by every JSON endpoint.
//!
//! Success and failure bodies have the same outer shape:
//! `{ success, statusCode, message, data?, errors? }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    /// `None` serializes as `null`, which is how "no such resource" is reported.
    #[serde(skip_serializing_if = "Payload::is_absent")]
    pub data: Payload<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

/// Distinguishes an omitted `data` key from an explicit `data: null`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Value(Option<T>),
    #[serde(skip)]
    Absent,
}

impl<T> Payload<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_data(StatusCode::OK, Some(data), message)
    }

    pub fn with_data(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success: status.as_u16() < 400,
            status_code: status.as_u16(),
            message: message.into(),
            data: Payload::Value(data),
            errors: None,
        }
    }
}

impl ApiResponse<Value> {
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
            data: Payload::Absent,
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<Value>) -> Self {
        self.errors = Some(errors);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
