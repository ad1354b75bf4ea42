mod api;
mod config;
mod database;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use services::{JwtIssuer, MongoUserStore, TokenIssuer, UserStore};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting Signup Service...");
    log::info!("📁 Environment: {}", config.environment);

    let db = match database::MongoDB::new(&config.mongodb_uri, &config.mongodb_database).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("✅ MongoDB connected: {}", config.mongodb_database);

    let store: Arc<dyn UserStore> = Arc::new(MongoUserStore::new(db.clone()));
    let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtIssuer::new(&config.jwt_secret));
    let store_data = web::Data::from(store);
    let tokens_data = web::Data::from(tokens);
    let config_data = web::Data::new(config.clone());

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("🌐 CORS enabled for: {}", config.cors_origins.join(", "));
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);

    let cors_origins = config.cors_origins.clone();

    // actix handles SIGINT/SIGTERM and drains in-flight requests before `run` returns
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(store_data.clone())
            .app_data(tokens_data.clone())
            .app_data(config_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::swagger::ApiDoc::openapi()),
            )
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .shutdown_timeout(10)
    .run()
    .await?;

    db.shutdown().await;
    log::info!("🔴 MongoDB connection closed");

    Ok(())
}
