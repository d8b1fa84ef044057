//! HTTP bridge to the assistant.

use super::state::{OptionalAgentHandle, ServerState};
use crate::agent::AgentError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

pub fn assistant_routes(state: ServerState) -> Router {
    Router::new()
        .route("/assistant", post(ask_assistant))
        .with_state(state)
}

#[derive(Deserialize, Debug)]
struct AssistantQuestion {
    question: String,
}

async fn ask_assistant(
    State(agent): State<OptionalAgentHandle>,
    Json(body): Json<AssistantQuestion>,
) -> Response {
    let Some(agent) = agent else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "assistant is disabled"})),
        )
            .into_response();
    };

    match agent.ask(body.question).await {
        Ok(answer) => Json(json!({"answer": answer})).into_response(),
        Err(AgentError::Unavailable) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "assistant is not running"})),
        )
            .into_response(),
        Err(err) => {
            error!("Assistant failed to answer: {}", err);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": err.to_string()})),
            )
                .into_response()
        }
    }
}
