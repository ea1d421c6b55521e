use actix_web::{
    error,
    http::StatusCode,
    HttpResponse,
};
use derive_more::{Display, Error};

#[derive(Debug, Clone, Display, Error, serde::Deserialize, serde::Serialize)]
pub enum ApiError {
    #[display(fmt = "not authenticated")]
    Unauthenticated,

    #[display(fmt = "not found")]
    NotFound,

    #[display(fmt = "not permitted: {}", _0)]
    Forbidden(#[error(not(source))] String),

    #[display(fmt = "invalid argument: {}", _0)]
    InvalidArgument(#[error(not(source))] String),

    #[display(fmt = "conflict: {}", _0)]
    Conflict(#[error(not(source))] String),

    #[display(fmt = "internal error")]
    InternalError,
}

impl ApiError {
    /// Stable machine-readable tag, so callers can render "not allowed"
    /// vs "not found" vs "bad input" without parsing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::NotFound => "not_found",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::InvalidArgument(_) => "invalid_argument",
            ApiError::Conflict(_) => "conflict",
            ApiError::InternalError => "internal",
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
