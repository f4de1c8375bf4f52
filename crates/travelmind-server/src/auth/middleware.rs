use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::auth::session::{self, SESSION_COOKIE};
use crate::error::AppError;
use crate::flash::Flash;
use crate::routes::AppState;
use crate::views;

pub const LOGIN_REQUIRED: &str = "Please log in to access this page.";

/// Gate for protected routes. Pages bounce to the login form with a notice;
/// JSON endpoints under `/api/` answer 401 instead.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let validated = match jar.get(SESSION_COOKIE) {
        Some(cookie) => match session::validate_session(&state.db, cookie.value()) {
            Ok(pair) => Some(pair),
            Err(AppError::Unauthorized) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let Some((_session, user)) = validated else {
        if request.uri().path().starts_with("/api/") {
            return Ok(AppError::Unauthorized.into_response());
        }
        tracing::debug!(path = %request.uri().path(), "Unauthenticated page request");
        return Ok(views::redirect_with(
            jar,
            &state.config.session_secret,
            Flash::error(LOGIN_REQUIRED),
            "/login",
        ));
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
