mod db;
mod inference_client;
mod routes;

use std::env;
use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use db::history_repository::HistoryRepository;
use inference_client::InferenceClient;
use routes::{UploadDir, configure_routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let inference_url = env::var("INFERENCE_SERVICE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8001".to_string());
    let database_url = env::var("DATABASE_URL").unwrap();
    let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));

    std::fs::create_dir_all(&upload_dir)?;

    let pool = db::create_pool(&database_url).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Invalid database configuration: {e}"),
        )
    })?;
    if let Err(e) = db::run_migrations(&pool).await {
        // The store may come up later; inserts fail per request until then.
        log::error!("Failed to apply history schema at startup: {e}");
    }

    let repository = HistoryRepository::new(pool);
    let client = InferenceClient::new(inference_url.clone());
    log::info!("Forwarding uploads to inference service at {inference_url}");

    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting gateway on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(repository.clone()))
            .app_data(web::Data::new(UploadDir(upload_dir.clone())))
            .configure(|cfg| configure_routes(cfg, &upload_dir))
    })
    .bind(&bind_address)?
    .run()
    .await
}
