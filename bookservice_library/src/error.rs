use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::WWW_AUTHENTICATE;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, ResponseError};

use crate::api::{BookId, ErrorResponse};
use crate::books_repository::BookRepositoryError;
use crate::validation::ValidationError;

/// Every way a request to the books api can fail. The display text is the message sent to the caller
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid authentication credentials")]
    Authentication,

    #[error("Not enough permissions")]
    Authorization,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Book with ID {0} not found in the library.")]
    BookNotFound(BookId),

    #[error("No books available in the library.")]
    LibraryEmpty,

    #[error("A book with this title and author already exists.")]
    Conflict,

    #[error("Service temporarily unavailable. Please try again later.")]
    ServiceUnavailable,

    #[error("An unexpected error occurred. Please try again later.")]
    Internal,
}

impl ApiError {
    /// Logs the repository failure for `endpoint` and hides its details behind a public message
    pub fn from_repository(endpoint: &str, err: BookRepositoryError) -> Self {
        match err {
            BookRepositoryError::Duplicate => {
                tracing::error!("Database integrity error in {}: {}", endpoint, err);
                ApiError::Conflict
            }
            BookRepositoryError::DatabaseFailure(_) | BookRepositoryError::PoolFailure(_) => {
                tracing::error!("Database error in {}: {}", endpoint, err);
                ApiError::ServiceUnavailable
            }
            BookRepositoryError::Other(_) => {
                tracing::error!("Unexpected error in {}: {}", endpoint, err);
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authentication => StatusCode::UNAUTHORIZED,
            ApiError::Authorization => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BookNotFound(_) | ApiError::LibraryEmpty => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::Authentication) {
            response.insert_header((WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

/// Replaces the body of any 500 response with the generic internal error, whatever produced it
pub fn normalize_internal_error<B: MessageBody>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    if let Some(err) = res.response().error() {
        tracing::error!("Unexpected error in {}: {}", res.request().path(), err);
    }
    let (req, _) = res.into_parts();
    let response = ApiError::Internal.error_response();
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}
