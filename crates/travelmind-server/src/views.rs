//! Page responses. Templating lives outside this server, so a page is the
//! JSON context a template would receive: the view name, the notices to show
//! once, and whatever data the handler attached.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::flash::{self, Flash};

#[derive(Debug)]
pub struct View {
    status: StatusCode,
    name: &'static str,
    flashes: Vec<Flash>,
    context: Map<String, Value>,
}

impl View {
    pub fn new(name: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            name,
            flashes: Vec::new(),
            context: Map::new(),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn flash(mut self, flash: Flash) -> Self {
        self.flashes.push(flash);
        self
    }

    /// Renders the page, showing (and clearing) any notices queued by
    /// earlier requests ahead of this page's own.
    pub fn render(self, jar: CookieJar, secret: &str) -> Response {
        let (jar, mut pending) = flash::take(jar, secret);
        pending.extend(self.flashes);

        let mut body = Map::new();
        body.insert("view".to_string(), Value::String(self.name.to_string()));
        body.insert(
            "flashes".to_string(),
            serde_json::to_value(&pending).unwrap_or(Value::Array(Vec::new())),
        );
        body.extend(self.context);

        (self.status, jar, Json(Value::Object(body))).into_response()
    }

    /// Re-renders a form after a failed submission: each user-facing message
    /// becomes an error notice and the status follows the error.
    pub fn render_error(self, err: AppError, jar: CookieJar, secret: &str) -> Response {
        let status = err.status();
        let view = err
            .user_messages()
            .into_iter()
            .fold(self.status(status), |view, msg| view.flash(Flash::error(msg)));
        view.render(jar, secret)
    }
}

/// Queues `flash` and sends the browser to `to`.
pub fn redirect_with(jar: CookieJar, secret: &str, flash: Flash, to: &str) -> Response {
    (flash::push(jar, secret, flash), Redirect::to(to)).into_response()
}
