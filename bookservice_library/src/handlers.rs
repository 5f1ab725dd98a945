use std::sync::Arc;

use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{AllowedMethodsResponse, BookCreate, BookUpdate};
use crate::auth::AdminClaims;
use crate::books_repository::BookRepository;
use crate::error::ApiError;
use crate::validation::{parse_book_id, validate_book_update, validate_new_book};

pub const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "OPTIONS"];

/// Logs a request rejected by `endpoint` before passing the error on
fn rejected(endpoint: &str, err: impl Into<ApiError>) -> ApiError {
    let err = err.into();
    tracing::warn!("Request rejected in {}: {}", endpoint, err);
    err
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_all_books(
    _claims: AdminClaims,
    books_repository: Data<Arc<dyn BookRepository>>,
) -> Result<HttpResponse, Error> {
    let books = books_repository
        .list_books()
        .await
        .map_err(|err| ApiError::from_repository("get_books", err))?;

    if books.is_empty() {
        return Err(rejected("get_books", ApiError::LibraryEmpty).into());
    }
    Ok(HttpResponse::Ok().json(books))
}

#[api_v2_operation]
pub async fn get_book(
    _claims: AdminClaims,
    books_repository: Data<Arc<dyn BookRepository>>,
    book_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let book_id = parse_book_id(&book_id).map_err(|err| rejected("get_book", err))?;

    match books_repository
        .get_book(book_id)
        .await
        .map_err(|err| ApiError::from_repository("get_book", err))?
    {
        Some(book) => Ok(HttpResponse::Ok().json(book)),
        None => Err(rejected("get_book", ApiError::BookNotFound(book_id)).into()),
    }
}

#[api_v2_operation]
pub async fn add_book(
    _claims: AdminClaims,
    books_repository: Data<Arc<dyn BookRepository>>,
    book: web::Json<BookCreate>,
) -> Result<HttpResponse, Error> {
    let book = book.into_inner();
    validate_new_book(&book).map_err(|err| rejected("create_book", err))?;

    let book = books_repository
        .add_book(book)
        .await
        .map_err(|err| ApiError::from_repository("create_book", err))?;

    tracing::info!("Added book {}", book.id);
    Ok(HttpResponse::Created().json(book))
}

#[api_v2_operation]
pub async fn update_book(
    _claims: AdminClaims,
    books_repository: Data<Arc<dyn BookRepository>>,
    book_id: web::Path<String>,
    update: web::Json<BookUpdate>,
) -> Result<HttpResponse, Error> {
    let book_id = parse_book_id(&book_id).map_err(|err| rejected("update_book", err))?;
    let update = update.into_inner();
    validate_book_update(&update).map_err(|err| rejected("update_book", err))?;

    match books_repository
        .update_book(book_id, update)
        .await
        .map_err(|err| ApiError::from_repository("update_book", err))?
    {
        Some(book) => Ok(HttpResponse::Ok().json(book)),
        None => Err(rejected("update_book", ApiError::BookNotFound(book_id)).into()),
    }
}

#[api_v2_operation]
pub async fn delete_book(
    _claims: AdminClaims,
    books_repository: Data<Arc<dyn BookRepository>>,
    book_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let book_id = parse_book_id(&book_id).map_err(|err| rejected("delete_book", err))?;

    let deleted = books_repository
        .delete_book(book_id)
        .await
        .map_err(|err| ApiError::from_repository("delete_book", err))?;

    if !deleted {
        return Err(rejected("delete_book", ApiError::BookNotFound(book_id)).into());
    }
    Ok(HttpResponse::NoContent().finish())
}

#[api_v2_operation]
pub async fn allowed_methods(_claims: AdminClaims) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(AllowedMethodsResponse {
        allowed_methods: ALLOWED_METHODS.iter().map(|method| method.to_string()).collect(),
    }))
}
