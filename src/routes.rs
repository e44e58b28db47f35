use axum::{Json, Router, extract::{Path, State}, http::{StatusCode, header}, response::{IntoResponse, Response}, routing::{get, post}};
use std::{collections::HashMap, sync::Arc};
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    assistant::Assistant,
    chat::{respond, ChatError, ChatSession, PendingTurn, SUGGESTIONS},
    estimator::{estimate, summarize},
    models::{ChatMessage, EmissionInput, EstimateResponse, SendMessageRequest, SendMessageResponse, SessionView},
    report::generate_report,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, ChatSession>>>,
    pub assistant: Arc<dyn Assistant>,
}

impl From<ChatError> for StatusCode {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::Busy => StatusCode::CONFLICT,
            ChatError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/estimate", post(estimate_emissions))
        .route("/api/estimate/report", post(export_report))
        .route("/api/chat", post(create_session))
        .route("/api/chat/suggestions", get(suggestions))
        .route("/api/chat/:id", get(get_session).delete(delete_session))
        .route("/api/chat/:id/message", post(send_message))
        .with_state(state)
}

pub async fn estimate_emissions(Json(input): Json<EmissionInput>) -> Json<EstimateResponse> {
    let result = estimate(&input);
    let summary = summarize(&result);
    tracing::info!("🌍 Estimated {} kg CO2e (highest: {:?})", result.total_emissions, summary.highest_category);
    Json(EstimateResponse { result, summary })
}

pub async fn export_report(Json(input): Json<EmissionInput>) -> Result<Response, StatusCode> {
    let result = estimate(&input);
    let pdf_bytes = generate_report(&result).map_err(|e| {
        tracing::error!("❌ Report generation failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"carbon_footprint.pdf\""),
    ];
    Ok((StatusCode::OK, headers, pdf_bytes).into_response())
}

pub async fn suggestions() -> Json<Vec<&'static str>> {
    Json(SUGGESTIONS.to_vec())
}

// Probes the assistant before answering so the first send already sees the result.
pub async fn create_session(State(state): State<AppState>) -> Json<SessionView> {
    let id = Uuid::new_v4();
    state.sessions.write().insert(id, ChatSession::new(id));
    tracing::info!("🎯 Created chat session {}", id);

    let reachable = match state.assistant.probe().await {
        Ok(()) => true,
        Err(e) => {
            tracing::info!("EcoChat API is not available, using fallback mode: {}", e);
            false
        }
    };

    let mut guard = state.sessions.write();
    let session = guard.entry(id).or_insert_with(|| ChatSession::new(id));
    session.apply_probe(reachable);
    Json(session.view())
}

pub async fn get_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Response {
    if let Some(s) = state.sessions.read().get(&id) { Json(s.view()).into_response() } else { StatusCode::NOT_FOUND.into_response() }
}

pub async fn delete_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> StatusCode {
    if state.sessions.write().remove(&id).is_some() { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

pub async fn send_message(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, StatusCode> {
    let turn = {
        let mut guard = state.sessions.write();
        let session = guard.get_mut(&id).ok_or(ChatError::NotFound)?;
        session.begin_turn(&body.message)?
    };

    // Spawned so the turn still completes if the client goes away mid-call
    let reply = tokio::spawn(run_turn(state.clone(), id, turn))
        .await
        .map_err(|e| {
            tracing::error!("❌ Chat turn for session {} failed: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })??;

    let mode = state.sessions.read().get(&id).map(|s| s.mode()).ok_or(ChatError::NotFound)?;
    Ok(Json(SendMessageResponse { reply, mode, mode_label: mode.label().to_string() }))
}

async fn run_turn(state: AppState, id: Uuid, turn: PendingTurn) -> Result<ChatMessage, ChatError> {
    // The assistant call runs outside the lock
    let (reply_text, mode) = respond(state.assistant.as_ref(), &turn.text, turn.mode, &turn.history).await;

    let mut guard = state.sessions.write();
    let session = guard.get_mut(&id).ok_or(ChatError::NotFound)?;
    Ok(session.complete_turn(reply_text, mode))
}

/// Drops sessions with no activity for `ttl`; returns how many were removed.
pub fn expire_idle_sessions(state: &AppState, ttl: std::time::Duration) -> usize {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    let now = Utc::now();
    let mut guard = state.sessions.write();
    let before = guard.len();
    guard.retain(|_, session| !session.is_idle(now, ttl));
    before - guard.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantError;
    use crate::chat::{CONNECTION_LOST_REPLY, GREETING};
    use crate::models::{AssistantRequest, ChatMode, EstimateResponse, Sender};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FixedAssistant {
        online: bool,
    }

    #[async_trait]
    impl Assistant for FixedAssistant {
        async fn probe(&self) -> Result<(), AssistantError> {
            if self.online { Ok(()) } else { Err(AssistantError::Http("connection refused".into())) }
        }

        async fn ask(&self, request: &AssistantRequest) -> Result<Option<String>, AssistantError> {
            if self.online {
                Ok(Some(format!("remote answer to: {}", request.message)))
            } else {
                Err(AssistantError::Http("connection refused".into()))
            }
        }
    }

    /// Answers after a delay so a send can be cut off mid-call.
    struct SlowAssistant {
        delay: std::time::Duration,
    }

    #[async_trait]
    impl Assistant for SlowAssistant {
        async fn probe(&self) -> Result<(), AssistantError> {
            Ok(())
        }

        async fn ask(&self, request: &AssistantRequest) -> Result<Option<String>, AssistantError> {
            tokio::time::sleep(self.delay).await;
            Ok(Some(format!("slow answer to: {}", request.message)))
        }
    }

    fn app(online: bool) -> (Router, AppState) {
        let state = AppState { sessions: Arc::default(), assistant: Arc::new(FixedAssistant { online }) };
        (router(state.clone()), state)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn estimate_endpoint_returns_result_and_summary() {
        let (app, _) = app(true);
        let body = json!({
            "transport": {"vehicleType": "car", "fuelType": "gasoline", "distanceKm": 100, "fuelEfficiencyKmPerL": 10},
            "lifestyle": {"dietType": "vegan", "shoppingFrequency": "minimal"}
        });
        let response = call(&app, "POST", "/api/estimate", Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let raw: Value = read_json(response).await;
        assert_eq!(raw["totalEmissions"], json!(66.5));
        assert_eq!(raw["breakdowns"]["transport"], json!(23.0));
        assert_eq!(raw["summary"]["comparison"], json!("lower"));

        let parsed: EstimateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.result.recommendations.len(), 4);
    }

    #[tokio::test]
    async fn report_endpoint_serves_pdf() {
        let (app, _) = app(true);
        let response = call(&app, "POST", "/api/estimate/report", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn suggestions_are_listed() {
        let (app, _) = app(true);
        let list: Vec<String> = read_json(call(&app, "GET", "/api/chat/suggestions", None).await).await;
        assert_eq!(list.len(), 5);
    }

    #[tokio::test]
    async fn live_session_round_trip() {
        let (app, state) = app(true);
        let view: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        assert_eq!(view.mode, ChatMode::Live);
        assert_eq!(view.mode_label, "Online");
        assert_eq!(view.messages[0].text, GREETING);

        let uri = format!("/api/chat/{}/message", view.id);
        let reply: SendMessageResponse = read_json(call(&app, "POST", &uri, Some(json!({"message": "hello"}))).await).await;
        assert_eq!(reply.reply.text, "remote answer to: hello");
        assert_eq!(reply.reply.sender, Sender::Bot);
        assert_eq!(reply.mode, ChatMode::Live);

        assert_eq!(state.sessions.read()[&view.id].messages().len(), 3);
    }

    #[tokio::test]
    async fn unreachable_assistant_starts_in_fallback() {
        let (app, _) = app(false);
        let view: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        assert_eq!(view.mode, ChatMode::Fallback);

        let uri = format!("/api/chat/{}/message", view.id);
        let reply: SendMessageResponse =
            read_json(call(&app, "POST", &uri, Some(json!({"message": "What about HDPE plastic?"}))).await).await;
        assert!(reply.reply.text.contains("HDPE"));
        assert_eq!(reply.mode_label, "Limited Mode");
    }

    #[tokio::test]
    async fn failure_mid_session_switches_to_fallback() {
        let (app, state) = app(false);
        let id = Uuid::new_v4();
        let mut session = ChatSession::new(id);
        session.apply_probe(true);
        state.sessions.write().insert(id, session);

        let uri = format!("/api/chat/{}/message", id);
        let reply: SendMessageResponse = read_json(call(&app, "POST", &uri, Some(json!({"message": "carbon?"}))).await).await;
        assert_eq!(reply.reply.text, CONNECTION_LOST_REPLY);
        assert_eq!(reply.mode, ChatMode::Fallback);

        let view: SessionView = read_json(call(&app, "GET", &format!("/api/chat/{}", id), None).await).await;
        assert_eq!(view.mode, ChatMode::Fallback);
        assert_eq!(view.messages.len(), 3);
        assert!(!view.pending);
    }

    #[tokio::test]
    async fn error_statuses() {
        let (app, state) = app(true);
        let missing = format!("/api/chat/{}/message", Uuid::new_v4());
        assert_eq!(call(&app, "POST", &missing, Some(json!({"message": "hi"}))).await.status(), StatusCode::NOT_FOUND);

        let view: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        let uri = format!("/api/chat/{}/message", view.id);
        assert_eq!(call(&app, "POST", &uri, Some(json!({"message": "  "}))).await.status(), StatusCode::BAD_REQUEST);

        state.sessions.write().get_mut(&view.id).unwrap().begin_turn("in flight").unwrap();
        assert_eq!(call(&app, "POST", &uri, Some(json!({"message": "again"}))).await.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn deleted_sessions_are_gone() {
        let (app, _) = app(true);
        let view: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        let uri = format!("/api/chat/{}", view.id);
        assert_eq!(call(&app, "DELETE", &uri, None).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(call(&app, "GET", &uri, None).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(call(&app, "DELETE", &uri, None).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dropped_request_still_completes_the_turn() {
        let state = AppState {
            sessions: Arc::default(),
            assistant: Arc::new(SlowAssistant { delay: std::time::Duration::from_millis(200) }),
        };
        let app = router(state.clone());
        let view: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        let uri = format!("/api/chat/{}/message", view.id);

        let in_flight = {
            let (app, uri) = (app.clone(), uri.clone());
            tokio::spawn(async move { call(&app, "POST", &uri, Some(json!({"message": "first"}))).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(state.sessions.read()[&view.id].is_pending());
        in_flight.abort();

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        {
            let sessions = state.sessions.read();
            let session = &sessions[&view.id];
            assert!(!session.is_pending());
            assert_eq!(session.messages().len(), 3);
            assert_eq!(session.messages()[2].text, "slow answer to: first");
        }

        let response = call(&app, "POST", &uri, Some(json!({"message": "second"}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let reply: SendMessageResponse = read_json(response).await;
        assert_eq!(reply.reply.text, "slow answer to: second");
    }

    #[tokio::test]
    async fn idle_sessions_are_swept() {
        let (app, state) = app(true);
        let stale: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        let busy: SessionView = read_json(call(&app, "POST", "/api/chat", None).await).await;
        state.sessions.write().get_mut(&busy.id).unwrap().begin_turn("in flight").unwrap();

        // A generous ttl keeps everything
        assert_eq!(expire_idle_sessions(&state, std::time::Duration::from_secs(3600)), 0);
        assert_eq!(state.sessions.read().len(), 2);

        assert_eq!(expire_idle_sessions(&state, std::time::Duration::ZERO), 1);
        assert!(!state.sessions.read().contains_key(&stale.id));
        assert!(state.sessions.read().contains_key(&busy.id));
        assert_eq!(call(&app, "GET", &format!("/api/chat/{}", stale.id), None).await.status(), StatusCode::NOT_FOUND);
    }
}
