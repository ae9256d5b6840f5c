use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;

mod config;
mod controllers;
mod db;
mod error;
mod models;
mod notes;

use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    /// Server start time for uptime calculation
    pub started_at: Instant,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Notes backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    log::info!("Using database at {}", config.database_url);

    let db = Database::new(&config.database_url, config.db_pool_size).map_err(|e| {
        log::error!("Failed to open database: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let db = Arc::new(db);

    if config.seed_demo_data {
        match db.seed_demo_data() {
            Ok(true) => log::info!("Demo data inserted"),
            Ok(false) => log::info!("Demo data already present"),
            Err(e) => log::warn!("Failed to seed demo data: {}", e),
        }
    }

    let started_at = Instant::now();
    let bind_addr = config.bind_addr();
    log::info!("Starting server on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                started_at,
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
