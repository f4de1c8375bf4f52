mod auth;
mod chat;
mod pages;
mod profile;
mod trips;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::auth::middleware::require_auth;
use crate::config::Config;
use crate::db::DbPool;
use crate::services::responder::{CannedResponder, ResponseStrategy};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub responder: Arc<dyn ResponseStrategy>,
}

impl AppState {
    /// State with the keyword responder.
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config,
            responder: Arc::new(CannedResponder),
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(health));

    let mut auth_routes = Router::new()
        .route("/", get(pages::index))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password/{token}",
            get(auth::reset_password_page).post(auth::reset_password),
        );

    let mut protected = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/my-trips", get(trips::my_trips))
        .route("/trips", get(trips::my_trips))
        .route("/new-trip", get(trips::new_trip_page).post(trips::create))
        .route("/itinerary/{trip_id}", get(trips::itinerary))
        .route("/profile", get(profile::profile_page).post(profile::update_form))
        .route("/chat", get(chat::chat_page).post(chat::send_form))
        .route("/chat/{trip_id}", get(chat::trip_chat_page))
        .route("/api/chat/message", post(chat::send_message))
        .route("/api/profile/update", post(profile::update_json))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    if state.config.rate_limit {
        // Auth routes: 10 request burst, one token every 6 seconds per IP
        let auth_governor = GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .finish()
            .expect("valid auth rate limit");

        // Signed-in routes: 120 request burst, one token every 2 seconds per IP
        let api_governor = GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(120)
            .finish()
            .expect("valid api rate limit");

        auth_routes = auth_routes.layer(GovernorLayer::new(Arc::new(auth_governor)));
        protected = protected.layer(GovernorLayer::new(Arc::new(api_governor)));
    }

    Router::new()
        .merge(health_routes)
        .merge(auth_routes)
        .merge(protected)
        .with_state(state)
}
