mod model;
mod pipeline;
mod routes;

use std::env;
use std::path::{Path, PathBuf};

use actix_web::{App, HttpServer, web};

use model::ModelError;
use model::classifier::{DEFAULT_MIN_CONFIDENCE, DrynessClassifier};
use model::embedder::Embedder;
use pipeline::Pipeline;
use routes::configure_routes;

fn load_pipeline(
    vit_path: &Path,
    classifier_path: &Path,
    min_confidence: f32,
) -> Result<Pipeline, ModelError> {
    let embedder = Embedder::load(vit_path)?;
    log::info!("ViT encoder loaded from {}", vit_path.display());

    let classifier = DrynessClassifier::load(classifier_path, min_confidence)?;
    log::info!(
        "Dryness classifier loaded from {} (gate at {:.1}%)",
        classifier_path.display(),
        min_confidence
    );

    Ok(Pipeline::new(embedder, classifier))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let vit_path = PathBuf::from(
        env::var("VIT_MODEL_PATH").unwrap_or_else(|_| "models/vit_base_patch16_224.pt".to_string()),
    );
    let classifier_path = PathBuf::from(
        env::var("CLASSIFIER_MODEL_PATH")
            .unwrap_or_else(|_| "models/banana_dryness_xgb.onnx".to_string()),
    );
    let min_confidence = env::var("MIN_CONFIDENCE")
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(DEFAULT_MIN_CONFIDENCE);

    // A failed load keeps the process up but degraded; every /predict
    // call then fails fast until the service is restarted with working
    // model files.
    let pipeline = match load_pipeline(&vit_path, &classifier_path, min_confidence) {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            log::error!("Failed to load models at startup: {e}");
            None
        }
    };
    let pipeline = web::Data::new(pipeline);

    let port = env::var("PORT").unwrap_or_else(|_| "8001".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting inference service on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
