use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, NormalizePath};
use actix_web::{App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use bookservice_library::app_config::{config_app, json_config};
use bookservice_library::auth::TokenValidator;
use bookservice_library::books_repository::{
    BookRepository, InMemoryBookRepository, PostgresBooksRepository,
};
use bookservice_library::error::normalize_internal_error;
use bookservice_library::settings::Settings;

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() {
    let app_name = "bookservice_library";

    // Spans are exported to Jaeger in batches
    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name)
        .install_batch(TokioCurrentThread)
        .expect("Failed to install OpenTelemetry tracer.");

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(app_name.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to install `tracing` subscriber.")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let settings = Settings::load().context("Failed to load settings")?;
    tracing::info!("Loaded settings {:?}", settings);

    let token_validator = web::Data::new(
        TokenValidator::new(&settings.auth.jwt_secret, settings.auth.jwt_algorithm)
            .context("Invalid auth settings")?,
    );

    let books_repository: Arc<dyn BookRepository> = if settings.database.use_in_memory {
        tracing::warn!("Using in memory books repository, books are lost on restart");
        Arc::new(InMemoryBookRepository::default())
    } else {
        Arc::new(
            PostgresBooksRepository::init((&settings.database).into())
                .await
                .context("Failed to init postgres")?,
        )
    };

    tracing::info!(
        "starting HTTP server at http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(web::Data::new(books_repository.clone()))
            .app_data(token_validator.clone())
            .app_data(json_config())
            .wrap(ErrorHandlers::new().handler(
                StatusCode::INTERNAL_SERVER_ERROR,
                normalize_internal_error,
            ))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await?;

    Ok(())
}
