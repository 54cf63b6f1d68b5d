use std::io::Write;

use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::error;
use serde::Serialize;

use crate::model::ModelError;
use crate::pipeline::Pipeline;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

async fn predict(
    pipeline: web::Data<Option<Pipeline>>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    // Degraded state: a failed model load at startup fails every call fast.
    let Some(pipeline) = pipeline.get_ref() else {
        return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Model is not available".to_string(),
        }));
    };

    let mut image_data = Vec::new();
    let mut filename = String::new();
    while let Ok(Some(mut field)) = payload.try_next().await {
        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        if disposition.get_name() != Some("image") {
            continue;
        }
        if let Some(name) = disposition.get_filename() {
            filename = name.to_string();
        }
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_data.write_all(&data)?;
        }
    }

    if image_data.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No image provided".to_string(),
        }));
    }

    match pipeline.classify(&image_data, &filename) {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(ModelError::InvalidImage(msg)) => Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: format!("Invalid image: {msg}"),
        })),
        Err(e) => {
            error!("Prediction failed for '{}': {}", filename, e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Prediction failed: {e}"),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn predict_reports_degraded_state_when_models_did_not_load() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(None::<Pipeline>))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict")
            .insert_header(("content-type", "multipart/form-data; boundary=xyz"))
            .set_payload("--xyz--\r\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Model is not available");
    }

    #[actix_web::test]
    async fn health_answers_ok() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(None::<Pipeline>))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
