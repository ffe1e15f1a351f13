mod api;
mod config;
mod error;
mod handlers;
mod model;
mod registry;
mod services;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use config::Config;
use registry::{ModelRegistry, Subject};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/* ---------- Shared State ---------- */
pub struct AppState {
    pub registry: ModelRegistry,
}

/* ---------- main ---------- */
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subject_chat_api=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // Models are loaded before binding; the registry is read-only from here on.
    let registry = ModelRegistry::load(&config);
    for subject in Subject::ALL {
        if !registry.is_loaded(subject) {
            tracing::warn!(%subject, "Serving without a {subject} model");
        }
    }
    let app_state = web::Data::new(AppState { registry });

    tracing::info!("Server starting at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(handlers::routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
