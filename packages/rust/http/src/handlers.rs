use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, warn};

use leadline_core::RecordType;
use leadline_document::render_application_pdf;
use leadline_shared::Submission;

use crate::AppState;

/// Headers every response from the submission function carries.
pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type",
    ),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
];

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            CORS_HEADERS,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

pub(crate) async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, CORS_HEADERS)
}

pub(crate) async fn method_not_allowed() -> Response {
    ApiError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: "method not allowed".into(),
    }
    .into_response()
}

/// `POST /`: run one submission through the intake pipeline.
pub(crate) async fn submit(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let submission: Submission = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected submission body");
        ApiError::bad_request(format!("invalid submission: {e}"))
    })?;

    let receipt = state.intake.process(submission).await.map_err(|e| {
        error!(error = %e, "submission failed");
        ApiError::internal(e.to_string())
    })?;
    // The notification task runs on without us.
    drop(receipt.notification);

    let outcome = receipt.outcome;
    let mut body = json!({
        "success": true,
        "type": outcome.record_type.as_str(),
        "person_id": outcome.person_id.0,
    });
    match outcome.record_type {
        RecordType::Lead => {
            body["lead_id"] = json!(outcome.lead_id().map(|id| id.0.clone()));
        }
        RecordType::Deal => {
            body["deal_id"] = json!(outcome.deal_id().map(|id| id.0));
        }
    }
    Ok((StatusCode::OK, CORS_HEADERS, Json::<Value>(body)).into_response())
}

/// `GET /applications/:id/document`: render a stored application as PDF.
pub(crate) async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| ApiError::not_found("application storage is not configured"))?;

    let app = storage
        .get_application(&id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("application {id} not found")))?;

    let config = state.document.clone();
    let rendered = tokio::task::spawn_blocking(move || render_application_pdf(&app, &config))
        .await
        .map_err(|e| ApiError::internal(format!("render task failed: {e}")))?
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", rendered.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};

    use leadline_core::{IntakeService, Orchestrator};
    use leadline_notify::NotificationDispatcher;
    use leadline_shared::{CrmSettings, DocumentConfig, LifeInsuranceForm};
    use leadline_storage::Storage;

    use super::*;
    use crate::router;

    fn ok(data: Value) -> wiremock::ResponseTemplate {
        wiremock::ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
    }

    async fn test_state(server: &wiremock::MockServer) -> AppState {
        let settings = CrmSettings::new(&server.uri(), "tok").unwrap();
        let tmp = std::env::temp_dir().join(format!("leadline_test_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.expect("open test db");
        let intake = IntakeService::new(
            Orchestrator::from_settings(settings).unwrap(),
            NotificationDispatcher::disabled(),
        )
        .with_storage(Arc::new(storage));
        AppState::new(intake, DocumentConfig::default())
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn assert_cors(headers: &axum::http::HeaderMap) {
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn preflight_is_204_with_cors() {
        let server = wiremock::MockServer::start().await;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(test_state(&server).await, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_cors(&headers);
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "authorization, x-client-info, apikey, content-type"
        );
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn other_methods_are_405() {
        let server = wiremock::MockServer::start().await;
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(test_state(&server).await, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let server = wiremock::MockServer::start().await;
        let (status, headers, body) = send(
            test_state(&server).await,
            post(r#"{"submission_type":"sponsorship"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_cors(&headers);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn lead_submission_answers_with_ids() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .respond_with(ok(json!({ "items": [] })))
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(ok(json!({ "id": 12 })))
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/leads"))
            .respond_with(ok(json!({ "id": "lead-12" })))
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/notes"))
            .respond_with(ok(json!({})))
            .mount(&server)
            .await;

        let payload = json!({
            "submission_type": "contact",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@x.com"
        });
        let (status, headers, body) =
            send(test_state(&server).await, post(payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({ "success": true, "type": "lead", "person_id": 12, "lead_id": "lead-12" })
        );
    }

    #[tokio::test]
    async fn unresolvable_contact_is_500() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .respond_with(ok(json!({ "items": [] })))
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let payload = json!({ "submission_type": "living_trust_questionnaire", "applicant_email": "t@x.com" });
        let (status, _, body) = send(test_state(&server).await, post(payload.to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("contact resolution"));
    }

    #[tokio::test]
    async fn stored_application_downloads_as_pdf() {
        let server = wiremock::MockServer::start().await;
        let state = test_state(&server).await;
        let app = state
            .storage
            .as_ref()
            .unwrap()
            .save_application(Some("Ava Reyes".into()), None, None, LifeInsuranceForm::default())
            .await
            .unwrap();

        let request = Request::builder()
            .uri(format!("/applications/{}/document", app.id))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"LifeInsurance_Application_"));
        assert!(disposition.ends_with(".pdf\""));
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn unknown_application_is_404() {
        let server = wiremock::MockServer::start().await;
        let request = Request::builder()
            .uri("/applications/does-not-exist/document")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(test_state(&server).await, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
