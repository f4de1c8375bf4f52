use axum::{
    extract::{Path, State},
    response::Response,
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::flash::Flash;
use crate::models::{Trip, User};
use crate::routes::AppState;
use crate::services::trips::{self, NewTrip};
use crate::views::{self, View};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewTripForm {
    pub destination: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<String>,
}

impl From<NewTripForm> for NewTrip {
    fn from(form: NewTripForm) -> Self {
        NewTrip {
            destination: form.destination,
            start_date: form.start_date,
            end_date: form.end_date,
            budget: form.budget,
        }
    }
}

/// Itinerary page payload. Day-by-day plans are not generated yet, so `days`
/// is always empty.
#[derive(Debug, Serialize)]
pub struct Itinerary {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub travelers: Option<i64>,
    pub total_budget: Option<f64>,
    pub actual_cost: f64,
    pub status: String,
    pub days: Vec<serde_json::Value>,
}

impl From<Trip> for Itinerary {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            title: trip.title,
            destination: trip.destination.unwrap_or_else(|| "Unknown".to_string()),
            start_date: trip.start_date,
            end_date: trip.end_date,
            travelers: trip.travelers,
            total_budget: trip.budget,
            actual_cost: trip.actual_cost,
            status: trip.status,
            days: Vec::new(),
        }
    }
}

pub async fn my_trips(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
) -> AppResult<Response> {
    let trips = trips::all_trips(&state.db, &user.id)?;
    Ok(View::new("my_trips")
        .with("trips", trips)
        .render(jar, &state.config.session_secret))
}

pub async fn new_trip_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    View::new("new_trip").render(jar, &state.config.session_secret)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
    Form(form): Form<NewTripForm>,
) -> Response {
    let secret = &state.config.session_secret;
    match trips::create_trip(&state.db, &user.id, &form.into()) {
        Ok(_) => views::redirect_with(
            jar,
            secret,
            Flash::success("Trip created successfully!"),
            "/my-trips",
        ),
        Err(e) => View::new("new_trip").render_error(e, jar, secret),
    }
}

pub async fn itinerary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
    Path(trip_id): Path<String>,
) -> AppResult<Response> {
    let secret = &state.config.session_secret;
    let Some(trip) = trips::find_owned(&state.db, &user.id, &trip_id)? else {
        return Ok(views::redirect_with(
            jar,
            secret,
            Flash::error("Trip not found"),
            "/dashboard",
        ));
    };

    Ok(View::new("itinerary")
        .with("itinerary", Itinerary::from(trip))
        .render(jar, secret))
}
