use axum::{
    extract::State,
    response::Response,
    Extension, Form, Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::AppResult;
use crate::flash::Flash;
use crate::models::{User, UserPublic};
use crate::routes::AppState;
use crate::services::accounts::{self, ProfileUpdate};
use crate::views::{self, View};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub preferred_currency: Option<String>,
}

impl From<ProfileForm> for ProfileUpdate {
    fn from(form: ProfileForm) -> Self {
        // Blank selects keep the stored value; a blank phone clears it.
        let keep_if_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        ProfileUpdate {
            first_name: form.first_name,
            last_name: form.last_name,
            email: None,
            phone: form.phone,
            timezone: keep_if_blank(form.timezone),
            preferred_currency: keep_if_blank(form.preferred_currency),
            preferences: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileJson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub preferred_currency: Option<String>,
    pub preferences: Option<Map<String, Value>>,
}

impl From<ProfileJson> for ProfileUpdate {
    fn from(body: ProfileJson) -> Self {
        ProfileUpdate {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            phone: body.phone,
            timezone: body.timezone,
            preferred_currency: body.preferred_currency,
            preferences: body.preferences,
        }
    }
}

pub async fn profile_page(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
) -> Response {
    View::new("profile")
        .with("current_user", UserPublic::from(user))
        .render(jar, &state.config.session_secret)
}

pub async fn update_form(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Response {
    let secret = &state.config.session_secret;
    match accounts::update_profile(&state.db, &user, form.into()) {
        Ok(_) => views::redirect_with(
            jar,
            secret,
            Flash::success("Profile updated successfully!"),
            "/profile",
        ),
        Err(e) => View::new("profile")
            .with("current_user", UserPublic::from(user))
            .render_error(e, jar, secret),
    }
}

pub async fn update_json(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<ProfileJson>,
) -> AppResult<Json<Value>> {
    accounts::update_profile(&state.db, &user, body.into())?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
    })))
}
