//! Axum router configuration with middleware.
//!
//! Middleware: CORS (explicit allow-list, credentials allowed) and request
//! tracing.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use sera_core::conversation::store::ConversationStore;
use sera_types::config::CorsConfig;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(handlers::index::index))
        .route("/favicon.ico", get(handlers::index::favicon))
        .route("/health", get(health_check))
        .route("/chat", post(handlers::chat::chat))
        .route("/chat/callback", post(handlers::callback::chat_callback))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the configured origins only.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// GET /health - Liveness probe.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "users": state.store.user_count().await,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tokio::sync::{Semaphore, mpsc};
    use tower::ServiceExt;

    use sera_core::llm::box_provider::BoxLlmProvider;
    use sera_core::llm::provider::LlmProvider;
    use sera_types::config::RelayConfig;
    use sera_types::conversation::{Turn, UserId};
    use sera_types::llm::{Candidate, GenerateRequest, GenerateResponse, LlmError};

    use super::*;

    /// Provider that records requests and returns a fixed result, optionally
    /// holding each call until a permit is released.
    #[derive(Clone)]
    struct StubProvider {
        calls: Arc<Mutex<Vec<GenerateRequest>>>,
        gate: Option<Arc<Semaphore>>,
        result: Result<GenerateResponse, LlmError>,
    }

    impl StubProvider {
        fn replying(text: &str) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                gate: None,
                result: Ok(GenerateResponse {
                    candidates: vec![Candidate {
                        content: Some(Turn::model(text)),
                        finish_reason: Some("STOP".to_string()),
                    }],
                }),
            }
        }

        fn failing(err: LlmError) -> Self {
            Self {
                result: Err(err),
                ..Self::replying("")
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
            self.calls.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            self.result.clone()
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> RelayConfig {
        let mut config = RelayConfig::default();
        config.retry.initial_delay_ms = 1;
        config.persona.instructions = Some("You are a test persona.".to_string());
        config.web.index_path = dir.path().join("index.html");
        config
    }

    async fn app(provider: StubProvider, config: &RelayConfig) -> (Router, AppState) {
        let state = AppState::with_provider(config, BoxLlmProvider::new(provider))
            .await
            .unwrap();
        (build_router(state.clone(), &config.cors), state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Loopback endpoint that forwards every POSTed JSON body to a channel.
    async fn callback_receiver() -> (String, mpsc::UnboundedReceiver<serde_json::Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/hook",
            post(move |axum::Json(body): axum::Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body);
                    StatusCode::OK
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), rx)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let (router, _) = app(StubProvider::replying("hi"), &test_config(&dir)).await;

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["users"], 0);
    }

    #[tokio::test]
    async fn test_index_falls_back_to_builtin_page() {
        let dir = tempfile::TempDir::new().unwrap();
        let (router, _) = app(StubProvider::replying("hi"), &test_config(&dir)).await;

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("chat relay is running"));
    }

    #[tokio::test]
    async fn test_index_serves_configured_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config(&dir);
        tokio::fs::write(&config.web.index_path, "<h1>custom</h1>")
            .await
            .unwrap();
        let (router, _) = app(StubProvider::replying("hi"), &config).await;

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<h1>custom</h1>");
    }

    #[tokio::test]
    async fn test_favicon_is_no_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let (router, _) = app(StubProvider::replying("hi"), &test_config(&dir)).await;

        let response = router
            .oneshot(Request::get("/favicon.ico").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_chat_new_caller_gets_cookie_and_rendered_reply() {
        let dir = tempfile::TempDir::new().unwrap();
        let (router, state) = app(StubProvider::replying("Hello **there**"), &test_config(&dir)).await;

        let response = router
            .oneshot(post_json("/chat", serde_json::json!({"chat": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("user_id="));
        assert!(set_cookie.contains("SameSite=None"));

        let json = body_json(response).await;
        assert_eq!(json["response"], "<p>Hello <strong>there</strong></p>\n");
        assert_eq!(state.store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_chat_existing_cookie_accumulates_history() {
        let dir = tempfile::TempDir::new().unwrap();
        let (router, state) = app(StubProvider::replying("ok"), &test_config(&dir)).await;

        for text in ["one", "two"] {
            let mut request = post_json("/chat", serde_json::json!({"chat": text}));
            request
                .headers_mut()
                .insert("cookie", "user_id=alice".parse().unwrap());
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get("set-cookie").is_none());
        }

        let history = state.store.get(&UserId::parse("alice").unwrap()).await;
        assert_eq!(history.len(), 4);
        assert_eq!(history.turns()[2].text(), "two");
    }

    #[tokio::test]
    async fn test_chat_missing_field_forwards_empty_message() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = StubProvider::replying("ok");
        let (router, _) = app(provider.clone(), &test_config(&dir)).await;

        let response = router
            .oneshot(post_json("/chat", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].contents.last().unwrap().text(), "");
    }

    #[tokio::test]
    async fn test_chat_without_json_body_forwards_empty_message() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = StubProvider::replying("ok");
        let (router, _) = app(provider.clone(), &test_config(&dir)).await;

        let no_body = Request::builder()
            .method("POST")
            .uri("/chat")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(no_body).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_some());

        let form = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let response = router.oneshot(form).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.contents.last().unwrap().text().is_empty()));
    }

    #[tokio::test]
    async fn test_chat_fatal_error_is_a_200_with_apology() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = StubProvider::failing(LlmError::AuthenticationFailed("API key not valid".into()));
        let (router, _) = app(provider.clone(), &test_config(&dir)).await;

        let response = router
            .oneshot(post_json("/chat", serde_json::json!({"chat": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let text = json["response"].as_str().unwrap();
        assert!(text.starts_with("Sorry, something went wrong"));
        assert!(text.contains("API key not valid"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cors_allows_listed_origin_with_credentials() {
        let dir = tempfile::TempDir::new().unwrap();
        let (router, _) = app(StubProvider::replying("hi"), &test_config(&dir)).await;

        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/chat")
            .header("origin", "https://aisera.pages.dev")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(preflight).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "https://aisera.pages.dev"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");

        let foreign = Request::builder()
            .method("OPTIONS")
            .uri("/chat")
            .header("origin", "https://evil.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(foreign).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_callback_missing_url_is_rejected_without_upstream_call() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = StubProvider::replying("hi");
        let (router, _) = app(provider.clone(), &test_config(&dir)).await;

        let response = router
            .oneshot(post_json("/chat/callback", serde_json::json!({"chat": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("callbackUrl"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_callback_acknowledges_before_upstream_resolves() {
        let dir = tempfile::TempDir::new().unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let provider = StubProvider::replying("Done **now**").gated(gate.clone());
        let (router, _) = app(provider.clone(), &test_config(&dir)).await;
        let (url, mut received) = callback_receiver().await;

        let response = router
            .oneshot(post_json(
                "/chat/callback",
                serde_json::json!({"chat": "hi", "callbackUrl": url}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("set-cookie").is_some());
        let ack = body_json(response).await;
        assert!(ack["message"].as_str().unwrap().starts_with("Request accepted"));

        // Upstream is still held at the gate
        assert!(received.try_recv().is_err());

        gate.add_permits(1);
        let delivered = tokio::time::timeout(Duration::from_secs(5), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            delivered,
            serde_json::json!({"response": "<p>Done <strong>now</strong></p>\n"})
        );

        // Exactly one delivery
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(received.try_recv().is_err());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_callback_delivers_error_on_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.retry.max_attempts = 2;
        let provider = StubProvider::failing(LlmError::Unavailable("model overloaded".into()));
        let (router, _) = app(provider.clone(), &config).await;
        let (url, mut received) = callback_receiver().await;

        let response = router
            .oneshot(post_json(
                "/chat/callback",
                serde_json::json!({"chat": "hi", "callbackUrl": url}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let delivered = tokio::time::timeout(Duration::from_secs(5), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(
            delivered["error"]
                .as_str()
                .unwrap()
                .starts_with("Sorry, I tried several times")
        );
        assert!(delivered.get("response").is_none());
        assert_eq!(provider.call_count(), 2);
    }
}
