use actix_web::http::Method;
use actix_web::web::JsonConfig;
use paperclip::actix::web;

use crate::error::ApiError;
use crate::handlers;
use crate::validation::ValidationError;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/books")
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::get_all_books))
                        .route(web::post().to(handlers::add_book))
                        .route(web::method(Method::OPTIONS).to(handlers::allowed_methods)),
                )
                .service(
                    web::resource("/{book_id}")
                        .route(web::get().to(handlers::get_book))
                        .route(web::put().to(handlers::update_book))
                        .route(web::delete().to(handlers::delete_book)),
                ),
        );
}

/// Bodies that do not deserialize into the expected payload are rejected with 400
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, req| {
        tracing::warn!("Invalid request body for {}: {}", req.path(), err);
        ApiError::from(ValidationError::InvalidBody).into()
    })
}
