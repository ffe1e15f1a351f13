// src/handlers.rs

use super::AppState;
use super::api::{ChatRequest, ChatResponse, HealthResponse, ModelStatus};
use super::error::{ServiceError, json_error_handler};
use super::registry::{Subject, UnknownSubject};
use super::services;
use actix_web::{HttpResponse, Responder, get, post, web};

#[post("/api/chat")]
pub async fn chat(
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> Result<impl Responder, ServiceError> {
    let ChatRequest { message, subject } = body.into_inner();

    let message = message
        .filter(|m| !m.is_empty())
        .ok_or(ServiceError::InvalidInput)?;

    let subject: Subject = match subject {
        Some(name) => name
            .parse()
            .map_err(|UnknownSubject(name)| ServiceError::ModelUnavailable(name))?,
        None => Subject::Chemistry,
    };
    let model = state
        .registry
        .get(subject)
        .cloned()
        .ok_or_else(|| ServiceError::ModelUnavailable(subject.to_string()))?;

    // Scoring is CPU-bound; keep it off the async workers.
    let prediction = web::block(move || services::run_prediction(model.as_ref(), &message))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::error!(%subject, error = %e, "Prediction failed");
            ServiceError::Prediction(subject)
        })?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        response: prediction.label,
        confidence: prediction.confidence,
        subject,
    }))
}

#[get("/api/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        models: ModelStatus {
            chemistry: state.registry.is_loaded(Subject::Chemistry),
            biology: state.registry.is_loaded(Subject::Biology),
        },
    })
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(chat)
        .service(health);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Label, PredictError, TextClassifier};
    use crate::registry::{ModelHandle, ModelRegistry};
    use actix_web::{App, http::StatusCode, http::header::ContentType, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Fixed {
        label: &'static str,
        probabilities: Vec<f64>,
    }

    impl TextClassifier for Fixed {
        fn predict(&self, texts: &[&str]) -> Result<Vec<Label>, PredictError> {
            Ok(texts.iter().map(|_| Label::Text(self.label.to_string())).collect())
        }

        fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, PredictError> {
            Ok(texts.iter().map(|_| self.probabilities.clone()).collect())
        }
    }

    struct Broken;

    impl TextClassifier for Broken {
        fn predict(&self, _texts: &[&str]) -> Result<Vec<Label>, PredictError> {
            Err(PredictError::Shape("corrupt tables".to_string()))
        }

        fn predict_proba(&self, _texts: &[&str]) -> Result<Vec<Vec<f64>>, PredictError> {
            Err(PredictError::Shape("corrupt tables".to_string()))
        }
    }

    fn fixed(label: &'static str, probabilities: &[f64]) -> Option<ModelHandle> {
        Some(Arc::new(Fixed {
            label,
            probabilities: probabilities.to_vec(),
        }))
    }

    fn both_loaded() -> ModelRegistry {
        ModelRegistry::new(
            fixed("Water is neutral.", &[0.1, 0.8, 0.1]),
            fixed("Mitosis splits a cell in two.", &[0.6, 0.4]),
        )
    }

    async fn send(registry: ModelRegistry, req: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState { registry }))
                .configure(routes),
        )
        .await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    async fn post_chat(registry: ModelRegistry, body: Value) -> (StatusCode, Value) {
        send(registry, test::TestRequest::post().uri("/api/chat").set_json(body)).await
    }

    #[actix_web::test]
    async fn chemistry_question() {
        let (status, body) = post_chat(
            both_loaded(),
            json!({ "message": "What is the pH of water?", "subject": "chemistry" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "response": "Water is neutral.", "confidence": 0.8, "subject": "chemistry" })
        );
    }

    #[actix_web::test]
    async fn biology_question() {
        let (status, body) = post_chat(
            both_loaded(),
            json!({ "message": "Explain mitosis", "subject": "biology" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Mitosis splits a cell in two.");
        assert_eq!(body["confidence"], 0.6);
        assert_eq!(body["subject"], "biology");
    }

    #[actix_web::test]
    async fn subject_defaults_to_chemistry() {
        for body in [json!({ "message": "test" }), json!({ "message": "test", "subject": null })] {
            let (status, body) = post_chat(both_loaded(), body).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["subject"], "chemistry");
        }
    }

    #[actix_web::test]
    async fn missing_or_empty_message() {
        for body in [
            json!({ "message": "" }),
            json!({ "subject": "biology" }),
            json!({}),
        ] {
            let (status, body) = post_chat(both_loaded(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "No message provided" }));
        }
    }

    #[actix_web::test]
    async fn message_is_checked_before_subject() {
        let (status, _) = post_chat(both_loaded(), json!({ "message": "", "subject": "physics" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_subject() {
        let (status, body) =
            post_chat(both_loaded(), json!({ "message": "test", "subject": "physics" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Physics model not loaded" }));

        let (status, body) =
            post_chat(both_loaded(), json!({ "message": "test", "subject": "Chemistry" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Chemistry model not loaded" }));
    }

    #[actix_web::test]
    async fn model_that_failed_to_load() {
        let registry = ModelRegistry::new(None, fixed("ok", &[1.0]));
        let (status, body) = post_chat(registry, json!({ "message": "test" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Chemistry model not loaded" }));
    }

    #[actix_web::test]
    async fn prediction_failure() {
        let registry = ModelRegistry::new(fixed("ok", &[1.0]), Some(Arc::new(Broken)));
        let (status, body) =
            post_chat(registry, json!({ "message": "Explain mitosis", "subject": "biology" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Error processing your biology question" }));
    }

    #[actix_web::test]
    async fn malformed_body_is_an_internal_error() {
        let req = test::TestRequest::post()
            .uri("/api/chat")
            .insert_header(ContentType::json())
            .set_payload("{\"message\": ");
        let (status, body) = send(both_loaded(), req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

        let (status, body) = post_chat(both_loaded(), json!({ "message": 42 })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn bundled_models_end_to_end() {
        let registry = ModelRegistry::load(&Config::from_lookup(|_| None));
        let question = json!({ "message": "What is the pH of water?", "subject": "chemistry" });

        let (status, first) = post_chat(registry.clone(), question.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["subject"], "chemistry");
        let confidence = first["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));

        let (_, second) = post_chat(registry.clone(), question).await;
        assert_eq!(first, second);

        let (status, body) = post_chat(
            registry,
            json!({ "message": "Explain mitosis", "subject": "biology" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().starts_with("Mitosis"));
    }

    #[actix_web::test]
    async fn health_reports_loaded_models() {
        let registry = ModelRegistry::new(fixed("ok", &[1.0]), None);
        let (status, body) = send(registry, test::TestRequest::get().uri("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "ok", "models": { "chemistry": true, "biology": false } })
        );
    }
}
