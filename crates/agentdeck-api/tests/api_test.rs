// In-process API tests
// Run with: cargo test -p agentdeck-api --test api_test
// The router runs against InMemoryStore and MockLlmClient; no database or provider needed.

use agentdeck_api::auth::{AuthConfig, AuthMode, AuthState};
use agentdeck_api::{build_router, AppState};
use agentdeck_core::{
    ExecutionFilter, ExecutionStatus, ExecutionStore, InMemoryStore, LlmClient, LlmError,
    MockLlmClient, MockLlmResponse, NewUser, Store, ToolFilter, ToolStore, UserRole, UserStore,
    MODEL_CATALOG,
};
use agentdeck_storage::seed_builtin_tools;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    llm: Arc<MockLlmClient>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_mode(AuthMode::None)
    }

    fn with_mode(mode: AuthMode) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let llm = Arc::new(MockLlmClient::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let dyn_llm: Arc<dyn LlmClient> = llm.clone();
        let auth = AuthState::new(AuthConfig::with_secret(mode, "test-secret"));
        let router = build_router(AppState::new(dyn_store, dyn_llm, auth), "");
        Self { router, store, llm }
    }

    async fn user(&self, email: &str) -> Uuid {
        self.store
            .create_user(NewUser {
                email: email.to_string(),
                name: "Test User".to_string(),
                avatar: None,
                role: UserRole::User,
                password_hash: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn raw(&self, method: Method, uri: &str, body: Option<Value>) -> axum::response::Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.raw(method, uri, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Create an agent and return its id
    async fn agent(&self, user_id: Uuid, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/agents",
                Some(json!({"name": name, "userId": user_id})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn active_agent(&self, user_id: Uuid, name: &str) -> Uuid {
        let agent_id = self.agent(user_id, name).await;
        let (status, _) = self
            .send(
                Method::PUT,
                &format!("/agents/{}", agent_id),
                Some(json!({"status": "ACTIVE", "userId": user_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        agent_id
    }
}

/// `data:` payloads of a server-sent event body
fn sse_events(text: &str) -> Vec<Value> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

// =============================================================================
// Agents
// =============================================================================

#[tokio::test]
async fn test_new_agent_is_inactive_and_cannot_run() {
    let app = TestApp::new();
    let user_id = app.user("owner@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/agents",
            Some(json!({"name": "  Support Bot  ", "userId": user_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Agent created successfully");
    assert_eq!(body["data"]["name"], "Support Bot");
    assert_eq!(body["data"]["status"], "INACTIVE");
    assert_eq!(body["data"]["type"], "CHATBOT");
    assert_eq!(body["data"]["maxTokens"], 1000);
    let agent_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "hello", "userId": user_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");
    assert!(body.get("executionId").is_none());

    let executions = app
        .store
        .list_executions(ExecutionFilter::for_user(user_id))
        .await
        .unwrap();
    assert!(executions.is_empty());
    assert_eq!(app.llm.call_count().await, 0);
}

#[tokio::test]
async fn test_temperature_bounds_are_inclusive() {
    let app = TestApp::new();
    let user_id = app.user("temp@example.com").await;

    for (i, temperature) in [0.0, 2.0].into_iter().enumerate() {
        let (status, _) = app
            .send(
                Method::POST,
                "/agents",
                Some(json!({"name": format!("Agent {}", i), "temperature": temperature, "userId": user_id})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "temperature {}", temperature);
    }

    for temperature in [2.0001, -0.0001] {
        let (status, body) = app
            .send(
                Method::POST,
                "/agents",
                Some(json!({"name": "Out Of Range", "temperature": temperature, "userId": user_id})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "temperature {}", temperature);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(!body["details"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_validation_collects_every_failure() {
    let app = TestApp::new();
    let user_id = app.user("many@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/agents",
            Some(json!({
                "name": "ab",
                "temperature": 3,
                "maxTokens": 0,
                "model": "not-a-model",
                "userId": user_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_duplicate_agent_name_is_conflict() {
    let app = TestApp::new();
    let user_id = app.user("dup@example.com").await;
    app.agent(user_id, "Twin").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/agents",
            Some(json!({"name": "Twin", "userId": user_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_strangers_cannot_touch_private_agents() {
    let app = TestApp::new();
    let owner = app.user("owner@example.com").await;
    let stranger = app.user("stranger@example.com").await;
    let agent_id = app.agent(owner, "Private Bot").await;

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/agents/{}?userId={}", agent_id, stranger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/agents/{}?userId={}", agent_id, stranger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/agents/{}?userId={}", agent_id, owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["executionCount"], 0);
}

#[tokio::test]
async fn test_get_is_idempotent() {
    let app = TestApp::new();
    let user_id = app.user("reader@example.com").await;
    let agent_id = app.agent(user_id, "Reader").await;
    let uri = format!("/agents/{}?userId={}", agent_id, user_id);

    let (_, first) = app.send(Method::GET, &uri, None).await;
    let (_, second) = app.send(Method::GET, &uri, None).await;
    assert_eq!(first, second);

    let (_, list) = app
        .send(Method::GET, &format!("/agents?userId={}", user_id), None)
        .await;
    assert_eq!(list["count"], 1);
}

// =============================================================================
// Executions
// =============================================================================

#[tokio::test]
async fn test_execute_active_agent() {
    let app = TestApp::new();
    let user_id = app.user("runner@example.com").await;
    let agent_id = app.active_agent(user_id, "Runner").await;
    app.llm
        .push_response(MockLlmResponse::text("Hello there"))
        .await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "hi", "userId": user_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Agent executed successfully");
    assert_eq!(body["data"]["output"], "Hello there");
    assert_eq!(body["data"]["usage"]["totalTokens"], 30);
    assert_eq!(body["data"]["model"], "gpt-4o-mini-2024-07-18");

    let execution_id = body["data"]["executionId"].as_str().unwrap();
    let (status, detail) = app
        .send(
            Method::GET,
            &format!("/executions/{}?userId={}", execution_id, user_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["status"], "SUCCESS");
    assert_eq!(detail["data"]["output"]["message"], "Hello there");
    assert_eq!(detail["data"]["logs"].as_array().unwrap().len(), 2);

    let calls = app.llm.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].temperature, 0.7);

    let (_, dashboard) = app
        .send(
            Method::GET,
            &format!("/analytics/dashboard?userId={}", user_id),
            None,
        )
        .await;
    assert_eq!(dashboard["data"]["executions"]["total"], 1);
    assert_eq!(dashboard["data"]["executions"]["success"], 1);
    assert_eq!(dashboard["data"]["totalTokens"], 30);
    assert_eq!(dashboard["data"]["agents"]["active"], 1);
}

#[tokio::test]
async fn test_execute_requires_input() {
    let app = TestApp::new();
    let user_id = app.user("empty@example.com").await;
    let agent_id = app.active_agent(user_id, "Quiet").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "   ", "userId": user_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "input is required");
}

#[tokio::test]
async fn test_upstream_failure_is_502_with_execution_id() {
    let app = TestApp::new();
    let user_id = app.user("fail@example.com").await;
    let agent_id = app.active_agent(user_id, "Flaky").await;
    app.llm
        .push_response(MockLlmResponse::error(503, "overloaded"))
        .await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "hi", "userId": user_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"], "overloaded");

    let execution_id: Uuid = body["executionId"].as_str().unwrap().parse().unwrap();
    let execution = app.store.get_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.error.as_deref(), Some("overloaded"));

    let (_, errors) = app
        .send(
            Method::GET,
            &format!("/analytics/errors?userId={}", user_id),
            None,
        )
        .await;
    assert_eq!(errors["count"], 1);
    assert_eq!(errors["data"][0]["errorType"], "LLM_ERROR");
    assert_eq!(errors["data"][0]["error"], "overloaded");
}

#[tokio::test]
async fn test_stream_relays_chunks_and_persists_full_content() {
    let app = TestApp::new();
    let user_id = app.user("stream@example.com").await;
    let agent_id = app.active_agent(user_id, "Streamer").await;
    app.llm
        .push_response(MockLlmResponse::stream(["Hel", "lo", " world"]))
        .await;

    let response = app
        .raw(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "hi", "userId": user_id, "stream": true})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let events = sse_events(std::str::from_utf8(&bytes).unwrap());
    assert_eq!(events.len(), 4);

    let chunks: String = events
        .iter()
        .filter(|e| e["type"] == "chunk")
        .map(|e| e["content"].as_str().unwrap())
        .collect();
    let complete = events.last().unwrap();
    assert_eq!(complete["type"], "complete");
    assert_eq!(complete["fullContent"], "Hello world");
    assert_eq!(chunks, "Hello world");
    assert_eq!(events[2]["accumulated"], "Hello world");

    let execution_id: Uuid = complete["executionId"].as_str().unwrap().parse().unwrap();
    let execution = app.store.get_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Success);
    assert_eq!(execution.output.unwrap()["message"], "Hello world");
}

#[tokio::test]
async fn test_stream_failure_ends_with_error_event() {
    let app = TestApp::new();
    let user_id = app.user("streamfail@example.com").await;
    let agent_id = app.active_agent(user_id, "Breaker").await;
    app.llm
        .push_response(MockLlmResponse::stream_then_fail(
            ["par"],
            LlmError::with_status(500, "boom"),
        ))
        .await;

    let response = app
        .raw(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "hi", "userId": user_id, "stream": true})),
        )
        .await;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let events = sse_events(std::str::from_utf8(&bytes).unwrap());

    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["type"], "chunk");
    assert_eq!(events[1]["type"], "error");
    assert_eq!(events[1]["error"], "boom");

    let execution_id: Uuid = events[1]["executionId"].as_str().unwrap().parse().unwrap();
    let execution = app.store.get_execution(execution_id).await.unwrap().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Failed);
}

#[tokio::test]
async fn test_client_disconnect_cancels_execution() {
    let app = TestApp::new();
    let user_id = app.user("leaver@example.com").await;
    let agent_id = app.active_agent(user_id, "Staller").await;
    app.llm
        .push_response(MockLlmResponse::stream_then_hang(["first"]))
        .await;

    let response = app
        .raw(
            Method::POST,
            &format!("/agents/{}/execute", agent_id),
            Some(json!({"input": "hi", "userId": user_id, "stream": true})),
        )
        .await;
    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let data = frame.into_data().unwrap();
    assert!(std::str::from_utf8(&data).unwrap().contains("first"));
    drop(body);

    let mut status = ExecutionStatus::Running;
    for _ in 0..100 {
        let executions = app
            .store
            .list_executions(ExecutionFilter::for_user(user_id))
            .await
            .unwrap();
        status = executions[0].status;
        if status != ExecutionStatus::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, ExecutionStatus::Cancelled);
}

#[tokio::test]
async fn test_dropped_sync_request_cancels_execution() {
    let app = TestApp::new();
    let user_id = app.user("impatient@example.com").await;
    let agent_id = app.active_agent(user_id, "Sleeper").await;
    app.llm.push_response(MockLlmResponse::hang()).await;

    let path = format!("/agents/{}/execute", agent_id);
    let request = app.raw(
        Method::POST,
        &path,
        Some(json!({"input": "hi", "userId": user_id})),
    );
    let timed_out = tokio::time::timeout(Duration::from_millis(50), request).await;
    assert!(timed_out.is_err());

    let mut status = ExecutionStatus::Running;
    for _ in 0..100 {
        let executions = app
            .store
            .list_executions(ExecutionFilter::for_user(user_id))
            .await
            .unwrap();
        assert_eq!(executions.len(), 1);
        status = executions[0].status;
        if status != ExecutionStatus::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, ExecutionStatus::Cancelled);
}

#[tokio::test]
async fn test_history_filters_by_agent() {
    let app = TestApp::new();
    let user_id = app.user("history@example.com").await;
    let first = app.active_agent(user_id, "First").await;
    let second = app.active_agent(user_id, "Second").await;

    for agent_id in [first, second, second] {
        let (status, _) = app
            .send(
                Method::POST,
                &format!("/agents/{}/execute", agent_id),
                Some(json!({"input": "hi", "userId": user_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, all) = app
        .send(Method::GET, &format!("/executions?userId={}", user_id), None)
        .await;
    assert_eq!(all["count"], 3);

    let (_, filtered) = app
        .send(
            Method::GET,
            &format!("/executions?userId={}&agentId={}", user_id, second),
            None,
        )
        .await;
    assert_eq!(filtered["count"], 2);
}

// =============================================================================
// Workflows
// =============================================================================

#[tokio::test]
async fn test_workflow_with_steps() {
    let app = TestApp::new();
    let user_id = app.user("flow@example.com").await;
    let agent_id = app.agent(user_id, "Step Agent").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/workflows",
            Some(json!({
                "name": "Pipeline",
                "userId": user_id,
                "steps": [
                    {"name": "fetch", "type": "http"},
                    {"name": "summarize", "type": "agent", "agentId": agent_id}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["steps"][1]["position"], 1);

    let (status, body) = app
        .send(
            Method::POST,
            "/workflows",
            Some(json!({
                "name": "Broken",
                "userId": user_id,
                "steps": [{"name": "x", "type": "agent", "agentId": Uuid::now_v7()}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0], "steps[0] references an unknown agent");
}

// =============================================================================
// Tools
// =============================================================================

#[tokio::test]
async fn test_duplicate_tool_is_conflict() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::POST, "/tools", Some(json!({"name": " Weather "})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "weather");
    assert_eq!(body["data"]["type"], "CUSTOM");

    let (status, body) = app
        .send(Method::POST, "/tools", Some(json!({"name": "WEATHER"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_tool_categories_and_builtin_protection() {
    let app = TestApp::new();
    seed_builtin_tools(app.store.as_ref()).await.unwrap();

    let (status, body) = app.send(Method::GET, "/tools?action=categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["API"]["count"], 4);
    assert_eq!(body["data"]["CUSTOM"]["count"], 0);
    assert_eq!(body["data"]["API"]["icon"], "Globe");

    let (_, popular) = app.send(Method::GET, "/tools?action=popular", None).await;
    assert_eq!(popular["count"], 4);

    let builtin_id = popular["data"][0]["id"].as_str().unwrap();
    let (status, body) = app
        .send(Method::DELETE, &format!("/tools/{}", builtin_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/tools/{}", builtin_id),
            Some(json!({"isActive": false})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/tools/{}", builtin_id),
            Some(json!({"description": "Edited description"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], true);

    let (status, _) = app.send(Method::GET, "/tools?action=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Models
// =============================================================================

#[tokio::test]
async fn test_models_fall_back_to_catalog() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "api");
    assert_eq!(body["data"][0]["provider"], "llm7.io");

    app.llm
        .set_models(Err(LlmError::new("connection refused")))
        .await;
    let (status, body) = app.send(Method::GET, "/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "static");
    assert_eq!(body["count"], MODEL_CATALOG.len());

    let (_, test) = app.send(Method::GET, "/models?action=test", None).await;
    assert_eq!(test["success"], false);
    assert_eq!(test["message"], "Connection failed");
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({"type": "register", "email": "New@Example.com", "password": "secret1", "name": "New"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["user"]["email"], "new@example.com");

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "new@example.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "new@example.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["data"]["email"], "new@example.com");

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({"type": "register", "email": "new@example.com", "password": "secret1", "name": "Again"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_mode_requires_token() {
    let app = TestApp::with_mode(AuthMode::Full);
    let user_id = app.user("locked@example.com").await;

    let (status, body) = app
        .send(Method::GET, &format!("/agents?userId={}", user_id), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_full_mode_guards_tool_routes() {
    let app = TestApp::with_mode(AuthMode::Full);
    seed_builtin_tools(app.store.as_ref()).await.unwrap();

    let (status, body) = app
        .send(Method::POST, "/tools", Some(json!({"name": "anonymous"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, "/tools", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let tools = app.store.list_tools(ToolFilter::default()).await.unwrap();
    assert_eq!(tools.len(), 4);
    let tool_id = tools[0].id;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/tools/{}", tool_id),
            Some(json!({"description": "changed"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::DELETE, &format!("/tools/{}", tool_id), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let after = app.store.list_tools(ToolFilter::default()).await.unwrap();
    assert_eq!(after.len(), 4);
    assert!(after.iter().all(|t| t.is_active && t.name != "anonymous"));
}

// =============================================================================
// Router plumbing
// =============================================================================

#[tokio::test]
async fn test_wrong_method_is_json_405_with_allow() {
    let app = TestApp::new();

    let response = app.raw(Method::PATCH, "/agents", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers()[header::ALLOW].to_str().unwrap().to_string();
    assert!(allow.contains("GET"));
    assert!(allow.contains("POST"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_options_is_ok() {
    let app = TestApp::new();
    let response = app.raw(Method::OPTIONS, "/agents", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_and_health() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");

    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/agents")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
