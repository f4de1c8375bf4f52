//! TravelMind: trip planning backend.
//!
//! Session-authenticated pages for registering, signing in, listing and
//! creating trips, editing a profile and chatting with a keyword-driven trip
//! assistant. Pages answer with JSON view contexts; templating happens
//! elsewhere.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

pub use routes::{create_router, AppState};
