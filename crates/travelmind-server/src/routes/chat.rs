use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::flash::Flash;
use crate::models::User;
use crate::routes::AppState;
use crate::services::{chat, trips};
use crate::views::{self, View};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub message: String,
    pub trip_id: Option<String>,
}

pub async fn chat_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    View::new("chat")
        .with("trip", Value::Null)
        .with("trip_id", Value::Null)
        .with("messages", Vec::<Value>::new())
        .render(jar, &state.config.session_secret)
}

/// Conversation for one trip. A trip the caller doesn't own renders like a
/// blank chat, same as an unknown id.
pub async fn trip_chat_page(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
    Path(trip_id): Path<String>,
) -> AppResult<Response> {
    let trip = trips::find_owned(&state.db, &user.id, &trip_id)?;
    let messages = match &trip {
        Some(trip) => chat::list_messages(&state.db, &trip.id)?,
        None => Vec::new(),
    };

    Ok(View::new("chat")
        .with("trip", trip)
        .with("trip_id", &trip_id)
        .with("messages", messages)
        .render(jar, &state.config.session_secret))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<Value>> {
    let exchange = chat::send_message(
        &state.db,
        state.responder.as_ref(),
        &user.id,
        &body.message,
        body.trip_id.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "trip_id": exchange.trip.id,
        "user_message": exchange.user_message,
        "ai_response": exchange.ai_response,
    })))
}

/// Form fallback for clients without JavaScript.
pub async fn send_form(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
    Form(form): Form<ChatRequest>,
) -> Response {
    let secret = &state.config.session_secret;
    let trip_id = form.trip_id.filter(|id| !id.is_empty());
    let result = chat::send_message(
        &state.db,
        state.responder.as_ref(),
        &user.id,
        &form.message,
        trip_id.as_deref(),
    )
    .await;

    match result {
        Ok(exchange) => Redirect::to(&format!("/chat/{}", exchange.trip.id)).into_response(),
        Err(AppError::NotFound(msg)) => {
            views::redirect_with(jar, secret, Flash::error(msg), "/dashboard")
        }
        Err(e) => {
            let back = trip_id
                .map(|id| format!("/chat/{id}"))
                .unwrap_or_else(|| "/chat".to_string());
            let message = e.user_messages().join(" ");
            views::redirect_with(jar, secret, Flash::error(message), &back)
        }
    }
}
