use std::sync::Arc;

use actix_web::{middleware, App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use bookstore_catalog::app_config::config_app;
use bookstore_catalog::book_repository::{
    BookRepository, InMemoryBookRepository, PostgresBookRepository, PostgresBookRepositoryConfig,
};
use bookstore_catalog::metrics::Metrics;
use bookstore_catalog::settings::{Settings, StorageBackend, TelemetrySettings};

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
// Exporter setup failures must not take the service down: on error the
// service falls back to the plain structured-log subscriber.
#[allow(deprecated)]
fn init_telemetry(settings: &TelemetrySettings) {
    // Spans are exported in batch - recommended setup for a production application.
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Filter based on level - trace, debug, info, warn, error
    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    // Create a `tracing` layer to emit spans as structured logs to stdout
    let formatting_layer =
        BunyanFormattingLayer::new(settings.service_name.clone(), std::io::stdout);

    let mut pipeline =
        opentelemetry_jaeger::new_agent_pipeline().with_service_name(settings.service_name.clone());
    if let Some(endpoint) = &settings.agent_endpoint {
        pipeline = pipeline.with_endpoint(endpoint.clone());
    }

    match pipeline.install_batch(TokioCurrentThread) {
        Ok(tracer) => {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .with(JsonStorageLayer)
                .with(formatting_layer);
            if tracing::subscriber::set_global_default(subscriber).is_err() {
                eprintln!("Failed to install `tracing` subscriber");
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to install OpenTelemetry tracer: {}; continuing without trace export",
                err
            );
            let subscriber = Registry::default()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(formatting_layer);
            if tracing::subscriber::set_global_default(subscriber).is_err() {
                eprintln!("Failed to install `tracing` subscriber");
            }
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_telemetry(&settings.telemetry);

    let books_repository: Arc<dyn BookRepository + Send + Sync> = match settings.database.backend {
        StorageBackend::InMemory => Arc::new(InMemoryBookRepository::default()),
        StorageBackend::Postgres => Arc::new(
            PostgresBookRepository::init(PostgresBookRepositoryConfig {
                host: settings.database.host.clone(),
                port: settings.database.port,
                username: settings.database.username.clone(),
                password: settings.database.password.clone(),
                dbname: settings.database.dbname.clone(),
                sslmode: settings.database.sslmode.clone(),
            })
            .await
            .context("Failed to init postgres")?,
        ),
    };

    let metrics = web::Data::new(Metrics::new());

    tracing::info!(
        "starting HTTP server at http://{}:{}",
        settings.server.bind_address,
        settings.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(web::Data::new(books_repository.clone()))
            .app_data(metrics.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind((settings.server.bind_address.as_str(), settings.server.port))?
    .run()
    .await?;

    Ok(())
}
