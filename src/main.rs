use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod gemini;
mod models;
mod prompts;
mod routes;
mod types;

use config::AppConfig;
use gemini::GeminiClient;

pub struct AppState {
    pub config: AppConfig,
    pub pool: PgPool,
    pub gemini: GeminiClient,
}

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    if config.production {
        info!("running in production mode");
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let gemini = GeminiClient::new(&config.gemini_api_key)?;
    let port = config.port;
    let state = Arc::new(AppState {
        config,
        pool,
        gemini,
    });

    // One token every 9 seconds with a burst of 100 ≈ 100 chat requests per
    // peer IP per 15 minutes.
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(9)
        .burst_size(100)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limiter configuration"))?;

    info!("listening on port {}", port);

    HttpServer::new(move || {
        let cors = if state.config.production {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "DELETE"])
                .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION]);
            for origin in &state.config.allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        } else {
            Cors::permissive()
        };

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/chat")
                            .wrap(Governor::new(&governor_conf))
                            .service(routes::chat::chat),
                    )
                    .service(routes::chat::test_connection)
                    .service(routes::users::login)
                    .service(routes::users::list_users)
                    .service(routes::users::create_user)
                    .service(routes::users::delete_user)
                    .service(routes::sessions::admin_sessions)
                    .service(routes::sessions::session_messages)
                    .service(routes::sessions::user_sessions),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
