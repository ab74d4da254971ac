//! Response envelope and error mapping shared by every endpoint.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AnalysisError;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Failed run that still carries partial data
    pub fn partial(data: T, message: String) -> Self {
        ApiResponse {
            success: false,
            data: Some(data),
            error: None,
            message: Some(message),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

/// Error returned by a handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: Option<&'static str>,
    message: String,
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Validation failures become 400 with their code; anything else is a 500
/// carrying only the message
impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.code(), err.to_string())
        } else {
            ::log::error!("Request failed: {}", err);
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: None,
                message: err.to_string(),
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ::log::debug!("Rejected request body: {}", rejection.body_text());
        Self::bad_request("INVALID_REQUEST", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: self.code.map(str::to_string),
            message: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the API error shape
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
