//! POST /api/chat
//!
//! Sits behind the gate, so every request reaching it already carried a
//! valid session. Answers come from a [`ChatResponder`]; the default one is a
//! placeholder until a retrieval back end is wired in.

use std::sync::Arc;

use async_trait::async_trait;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::routes::response::{error_response, json_response, parse_json_body, BoxBody};
use crate::server::AppState;
use crate::types::GateError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub relevance_scores: Vec<f64>,
    pub used_web_search: bool,
}

/// Produces an answer for a legal question
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, request: &ChatRequest) -> Result<ChatResponse, GateError>;
}

/// Fixed acknowledgement with no sources
#[derive(Debug, Default)]
pub struct PlaceholderResponder;

pub const PLACEHOLDER_ANSWER: &str = "I understand your question. Once the backend is integrated, \
I'll provide detailed legal analysis and insights based on your query. For now, this is a \
simulated response.";

#[async_trait]
impl ChatResponder for PlaceholderResponder {
    async fn respond(&self, _request: &ChatRequest) -> Result<ChatResponse, GateError> {
        Ok(ChatResponse {
            answer: PLACEHOLDER_ANSWER.to_string(),
            sources: Vec::new(),
            relevance_scores: Vec::new(),
            used_web_search: false,
        })
    }
}

pub async fn handle_chat<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let request: ChatRequest = match parse_json_body(req).await {
        Ok(r) => r,
        Err(e) => return e.into(),
    };

    if request.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Question is required");
    }

    debug!(
        session = request.session_id.as_deref().unwrap_or("-"),
        chars = request.question.len(),
        "Chat question received"
    );

    match state.chat.respond(&request).await {
        Ok(answer) => json_response(StatusCode::OK, &answer),
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::response::test_support::{body_json, json_request};

    #[tokio::test]
    async fn test_placeholder_answer() {
        let state = Arc::new(AppState::for_tests());
        let req = json_request(
            "POST",
            "/api/chat",
            serde_json::json!({ "question": "Is a verbal contract binding?", "sessionId": "s-1" }),
        );
        let response = handle_chat(req, state).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["answer"], PLACEHOLDER_ANSWER);
        assert_eq!(body["usedWebSearch"], false);
        assert_eq!(body["sources"], serde_json::json!([]));
        assert_eq!(body["relevanceScores"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let state = Arc::new(AppState::for_tests());
        let req = json_request("POST", "/api/chat", serde_json::json!({ "question": "   " }));
        let response = handle_chat(req, state).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    struct EchoResponder;

    #[async_trait]
    impl ChatResponder for EchoResponder {
        async fn respond(&self, request: &ChatRequest) -> Result<ChatResponse, GateError> {
            Ok(ChatResponse {
                answer: request.question.to_uppercase(),
                sources: vec!["Restatement (Second) of Contracts § 110".into()],
                relevance_scores: vec![0.91],
                used_web_search: true,
            })
        }
    }

    #[tokio::test]
    async fn test_custom_responder() {
        let mut state = AppState::for_tests();
        state.chat = Arc::new(EchoResponder);
        let req = json_request("POST", "/api/chat", serde_json::json!({ "question": "statute of frauds" }));

        let body = body_json(handle_chat(req, Arc::new(state)).await).await;
        assert_eq!(body["answer"], "STATUTE OF FRAUDS");
        assert_eq!(body["usedWebSearch"], true);
        assert_eq!(body["relevanceScores"][0], 0.91);
    }
}
