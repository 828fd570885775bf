//! HTTP surface for the study assistant.
//!
//! - `POST /api/upload` – Multipart upload (field `file`, `.txt` or `.pdf`); extracts the
//!   text, summarizes it, and returns `{ material_id, filename, summary, bullet_summary }`.
//!   `POST /api/ai/upload-and-summarize` is an alias.
//! - `GET /api/summaries` – Stored materials, newest first.
//! - `GET /api/summaries/:id` – `{ long_summary, short_summary }` for one material.
//! - `POST /api/question` – `{ material_id, question }` → `{ answer }`.
//! - `POST /api/ai/parse-bullet-summary/:id` – Re-parse bullets from the stored completion.
//! - `GET /metrics`, `GET /commands` – Counters and a machine-readable command catalog.
//!
//! Failures are returned as `{ "error": ..., "detail": ... }` with a status that separates
//! input problems (4xx) from configuration and provider failures (5xx).

use crate::config::Config;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    FailureKind, MaterialListing, MaterialSummary, ServiceError, StudyApi, UploadOutcome,
};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Room for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the HTTP router exposing the study API surface.
pub fn create_router<S>(service: Arc<S>, config: &Config) -> Router
where
    S: StudyApi + 'static,
{
    let upload_state = UploadState {
        service: service.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };

    let uploads = Router::new()
        .route("/api/upload", post(upload_document::<S>))
        .route("/api/ai/upload-and-summarize", post(upload_document::<S>))
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .with_state(upload_state);

    let router = Router::new()
        .route("/api/summaries", get(list_summaries::<S>))
        .route("/api/summaries/:id", get(show_summary::<S>))
        .route("/api/question", post(ask_question::<S>).get(question_get))
        .route(
            "/api/ai/parse-bullet-summary/:id",
            post(reparse_bullets::<S>),
        )
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
        .merge(uploads);

    match cors_layer(&config.cors_allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

struct UploadState<S> {
    service: Arc<S>,
    max_upload_bytes: usize,
}

impl<S> Clone for UploadState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Accept a multipart upload, summarize it, and persist the material.
async fn upload_document<S>(
    State(state): State<UploadState<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadOutcome>, AppError>
where
    S: StudyApi,
{
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::new(error.status(), "Invalid upload.", error.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::new(error.status(), "Invalid upload.", error.body_text()))?;
        upload = Some((filename, bytes));
    }

    let Some((filename, bytes)) = upload else {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "A file is required.",
            "multipart field `file` is missing",
        ));
    };
    if bytes.len() > state.max_upload_bytes {
        return Err(AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "File is too large.",
            format!("limit is {} bytes", state.max_upload_bytes),
        ));
    }

    let outcome = state
        .service
        .upload_and_summarize(filename, bytes.to_vec())
        .await?;
    tracing::info!(
        material_id = outcome.material_id,
        bullets = outcome.bullet_summary.len(),
        "Upload request completed"
    );
    Ok(Json(outcome))
}

/// List stored materials, newest first.
async fn list_summaries<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<Vec<MaterialListing>>, AppError>
where
    S: StudyApi,
{
    Ok(Json(service.list_materials().await?))
}

/// Return the paragraph and bullet summaries of one material.
async fn show_summary<S>(
    State(service): State<Arc<S>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<MaterialSummary>, AppError>
where
    S: StudyApi,
{
    let Path(id) = id?;
    Ok(Json(service.material_summary(id).await?))
}

/// Request body for `POST /api/question`.
#[derive(Deserialize)]
struct QuestionRequest {
    material_id: u64,
    question: String,
}

/// Response body for `POST /api/question`.
#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
}

async fn ask_question<S>(
    State(service): State<Arc<S>>,
    request: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError>
where
    S: StudyApi,
{
    let Json(request) = request?;
    let answer = service.ask(request.material_id, request.question).await?;
    Ok(Json(AnswerResponse { answer }))
}

async fn question_get() -> Json<serde_json::Value> {
    Json(json!({ "message": "GET not supported, use POST" }))
}

async fn reparse_bullets<S>(
    State(service): State<Arc<S>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<MaterialSummary>, AppError>
where
    S: StudyApi,
{
    let Path(id) = id?;
    Ok(Json(service.reparse_bullets(id).await?))
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: StudyApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by clients.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/api/upload",
                description: "Upload a .txt or .pdf file as multipart field `file`; returns { material_id, filename, summary, bullet_summary }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "list_summaries",
                method: "GET",
                path: "/api/summaries",
                description: "List stored materials (id, filename, title, summary, created_at), newest first.",
                request_example: None,
            },
            CommandDescriptor {
                name: "show_summary",
                method: "GET",
                path: "/api/summaries/:id",
                description: "Return { long_summary, short_summary } for one material.",
                request_example: None,
            },
            CommandDescriptor {
                name: "question",
                method: "POST",
                path: "/api/question",
                description: "Answer a question about a stored material; returns { answer }.",
                request_example: Some(json!({
                    "material_id": 1,
                    "question": "What is the main idea?"
                })),
            },
            CommandDescriptor {
                name: "parse_bullet_summary",
                method: "POST",
                path: "/api/ai/parse-bullet-summary/:id",
                description: "Re-parse the bullet summary from the stored model output.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization and question counters.",
                request_example: None,
            },
        ],
    })
}

/// JSON error response with a status code.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    error: String,
    detail: String,
}

impl AppError {
    fn new(status: StatusCode, error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            detail: detail.into(),
        }
    }

    fn from_failure(status: StatusCode, error: &str, kind: FailureKind) -> Self {
        Self::new(status, error, format!("{}: {kind}", kind.category()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.error, "detail": self.detail }));
        (self.status, body).into_response()
    }
}

// Extractor rejections become JSON 400s.
macro_rules! bad_request_from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    tracing::warn!(error = %rejection.body_text(), "Rejected malformed request");
                    Self::new(
                        StatusCode::BAD_REQUEST,
                        "Malformed request.",
                        rejection.body_text(),
                    )
                }
            }
        )+
    };
}

bad_request_from_rejection!(JsonRejection, MultipartRejection, PathRejection);

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        match &inner {
            ServiceError::Store(_) | ServiceError::Upload(_) => {
                tracing::error!(error = %inner, "Request failed");
            }
            _ => tracing::warn!(error = %inner, "Request failed"),
        }

        match inner {
            ServiceError::Summarization(kind) => Self::from_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Summarization failed. Please try again later.",
                kind,
            ),
            ServiceError::Answer(FailureKind::EmptyContext) => Self::from_failure(
                StatusCode::BAD_REQUEST,
                "Material content is empty.",
                FailureKind::EmptyContext,
            ),
            ServiceError::Answer(kind) => Self::from_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Answer generation failed.",
                kind,
            ),
            ServiceError::UnsupportedFile { kind, extension } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Unsupported file type. Upload a .txt or .pdf file.",
                format!("{}: extension {extension:?}", kind.category()),
            ),
            ServiceError::EmptyQuestion => Self::new(
                StatusCode::BAD_REQUEST,
                "A question is required.",
                "input: question is empty",
            ),
            ServiceError::NotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                "Material not found.",
                format!("no material with id {id}"),
            ),
            ServiceError::Store(_) | ServiceError::Upload(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error.",
                "storage",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use serde_json::Value;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-STUDYMATE-BOUNDARY";

    #[derive(Default)]
    struct StubStudyService {
        uploads: Mutex<Vec<(String, Vec<u8>)>>,
        questions: Mutex<Vec<(u64, String)>>,
        upload_failure: Option<FailureKind>,
    }

    #[async_trait]
    impl StudyApi for StubStudyService {
        async fn upload_and_summarize(
            &self,
            filename: String,
            bytes: Vec<u8>,
        ) -> Result<UploadOutcome, ServiceError> {
            self.uploads.lock().await.push((filename, bytes));
            if let Some(kind) = self.upload_failure {
                return Err(ServiceError::Summarization(kind));
            }
            Ok(UploadOutcome {
                material_id: 3,
                filename: "stored.txt".into(),
                summary: "Paragraph.".into(),
                bullet_summary: vec!["A".into(), "B".into()],
            })
        }

        async fn list_materials(&self) -> Result<Vec<MaterialListing>, ServiceError> {
            Ok(vec![MaterialListing {
                id: 3,
                filename: "stored.txt".into(),
                title: Some("notes".into()),
                summary: "Paragraph.".into(),
                created_at: "2025-01-01T00:00:00Z".into(),
            }])
        }

        async fn material_summary(&self, id: u64) -> Result<MaterialSummary, ServiceError> {
            if id != 3 {
                return Err(ServiceError::NotFound(id));
            }
            Ok(MaterialSummary {
                long_summary: "Paragraph.".into(),
                short_summary: vec!["A".into()],
            })
        }

        async fn ask(&self, material_id: u64, question: String) -> Result<String, ServiceError> {
            self.questions.lock().await.push((material_id, question));
            if material_id == 4 {
                return Err(ServiceError::Answer(FailureKind::EmptyContext));
            }
            Ok("Forty-two.".into())
        }

        async fn reparse_bullets(&self, id: u64) -> Result<MaterialSummary, ServiceError> {
            self.material_summary(id).await
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                materials_summarized: 5,
                ..MetricsSnapshot::default()
            }
        }
    }

    fn multipart_body(field: &str, filename: &str, content: &str) -> Body {
        Body::from(format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        ))
    }

    fn upload_request(path: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .expect("request")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn upload_route_forwards_file_and_returns_summary() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service.clone(), &Config::default());

        let response = app
            .oneshot(upload_request(
                "/api/upload",
                multipart_body("file", "notes.txt", "Some study notes"),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["material_id"], 3);
        assert_eq!(json["summary"], "Paragraph.");
        assert_eq!(json["bullet_summary"], json!(["A", "B"]));

        let uploads = service.uploads.lock().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "notes.txt");
        assert_eq!(uploads[0].1, b"Some study notes");
    }

    #[tokio::test]
    async fn upload_alias_route_is_served() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service, &Config::default());

        let response = app
            .oneshot(upload_request(
                "/api/ai/upload-and-summarize",
                multipart_body("file", "notes.txt", "body"),
            ))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_without_file_field_is_bad_request() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service.clone(), &Config::default());

        let response = app
            .oneshot(upload_request(
                "/api/upload",
                multipart_body("attachment", "notes.txt", "body"),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let service = Arc::new(StubStudyService::default());
        let config = Config {
            max_upload_bytes: 8,
            ..Config::default()
        };
        let app = create_router(service.clone(), &config);

        let response = app
            .oneshot(upload_request(
                "/api/upload",
                multipart_body("file", "notes.txt", "more than eight bytes"),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn summarization_failure_is_server_error_with_category() {
        let service = Arc::new(StubStudyService {
            upload_failure: Some(FailureKind::MissingCredential),
            ..StubStudyService::default()
        });
        let app = create_router(service, &Config::default());

        let response = app
            .oneshot(upload_request(
                "/api/upload",
                multipart_body("file", "notes.txt", "body"),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Summarization failed. Please try again later.");
        assert!(json["detail"].as_str().expect("detail").starts_with("configuration"));
    }

    #[tokio::test]
    async fn question_route_returns_answer() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service.clone(), &Config::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/question")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "material_id": 3, "question": "Meaning?" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "answer": "Forty-two." }));
        assert_eq!(
            service.questions.lock().await.as_slice(),
            &[(3, "Meaning?".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_context_maps_to_bad_request() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service, &Config::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/question")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "material_id": 4, "question": "Meaning?" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Material content is empty.");
    }

    #[tokio::test]
    async fn question_missing_field_is_json_bad_request() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service.clone(), &Config::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/question")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "material_id": 1 }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"]
                .to_str()
                .expect("content type"),
            "application/json"
        );
        let json = json_body(response).await;
        assert_eq!(json["error"], "Malformed request.");
        assert!(json["detail"].as_str().expect("detail").contains("question"));
        assert!(service.questions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn non_numeric_material_id_is_json_bad_request() {
        let app = create_router(Arc::new(StubStudyService::default()), &Config::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/summaries/latest")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Malformed request.");
    }

    #[tokio::test]
    async fn upload_without_multipart_body_is_json_bad_request() {
        let service = Arc::new(StubStudyService::default());
        let app = create_router(service.clone(), &Config::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/upload")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Malformed request.");
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn question_get_explains_usage() {
        let app = create_router(Arc::new(StubStudyService::default()), &Config::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/question")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "GET not supported, use POST" })
        );
    }

    #[tokio::test]
    async fn summaries_routes_list_and_show() {
        let service = Arc::new(StubStudyService::default());

        let list = create_router(service.clone(), &Config::default())
            .oneshot(
                Request::builder()
                    .uri("/api/summaries")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        let json = json_body(list).await;
        assert_eq!(json[0]["id"], 3);
        assert_eq!(json[0]["title"], "notes");

        let show = create_router(service.clone(), &Config::default())
            .oneshot(
                Request::builder()
                    .uri("/api/summaries/3")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(
            json_body(show).await,
            json!({ "long_summary": "Paragraph.", "short_summary": ["A"] })
        );

        let missing = create_router(service, &Config::default())
            .oneshot(
                Request::builder()
                    .uri("/api/summaries/9")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_route_reports_snapshot() {
        let app = create_router(Arc::new(StubStudyService::default()), &Config::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(json_body(response).await["materials_summarized"], 5);
    }

    #[tokio::test]
    async fn commands_catalog_exposes_upload_endpoint() {
        let commands = get_commands().await.0.commands;
        let upload = commands
            .iter()
            .find(|cmd| cmd.name == "upload")
            .expect("upload command present");

        assert_eq!(upload.method, "POST");
        assert_eq!(upload.path, "/api/upload");
        assert!(commands.iter().any(|cmd| cmd.path == "/api/question"));
    }

    #[test]
    fn cors_layer_requires_valid_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["https://app.example".to_string()]).is_some());
    }
}
