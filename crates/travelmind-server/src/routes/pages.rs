use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use axum_extra::extract::CookieJar;
use chrono::Datelike;

use crate::auth::session;
use crate::error::AppResult;
use crate::models::{User, UserPublic};
use crate::routes::AppState;
use crate::services::trips::{self, DashboardStats, RECENT_TRIPS_LIMIT};
use crate::views::View;

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    if session::current_user(&state.db, &jar)?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(View::new("landing").render(jar, &state.config.session_secret))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
) -> AppResult<Response> {
    let recent = trips::recent_trips(&state.db, &user.id, RECENT_TRIPS_LIMIT)?;
    let all = trips::all_trips(&state.db, &user.id)?;
    let stats = DashboardStats::from_trips(&all);

    Ok(View::new("dashboard")
        .with("current_user", UserPublic::from(user))
        .with("recent_trips", recent)
        .with("stats", stats)
        .with("current_year", chrono::Utc::now().year())
        .render(jar, &state.config.session_secret))
}
