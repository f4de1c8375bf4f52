use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::Trip;

pub const RECENT_TRIPS_LIMIT: usize = 5;

/// Raw trip form input; everything arrives as text.
#[derive(Debug, Clone, Default)]
pub struct NewTrip {
    pub destination: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct ValidTrip {
    destination: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    budget: Option<f64>,
}

impl NewTrip {
    fn validate(&self) -> AppResult<ValidTrip> {
        let mut problems = Vec::new();

        let destination = self.destination.trim().to_string();
        if destination.is_empty() {
            problems.push("Destination is required".to_string());
        }

        let mut parse_date = |label: &str, value: &Option<String>| match non_empty(value) {
            None => None,
            Some(v) => match NaiveDate::parse_from_str(v, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    problems.push(format!("{label} must be a date (YYYY-MM-DD)"));
                    None
                }
            },
        };
        let start_date = parse_date("Start date", &self.start_date);
        let end_date = parse_date("End date", &self.end_date);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                problems.push("End date cannot be before start date".to_string());
            }
        }

        let budget = match non_empty(&self.budget) {
            None => None,
            Some(v) => match v.parse::<f64>() {
                Ok(b) if b.is_finite() && b >= 0.0 => Some(b),
                _ => {
                    problems.push("Budget must be a non-negative number".to_string());
                    None
                }
            },
        };

        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }
        Ok(ValidTrip { destination, start_date, end_date, budget })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn create_trip(pool: &DbPool, user_id: &str, form: &NewTrip) -> AppResult<Trip> {
    let valid = form.validate()?;
    let trip = Trip {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: valid.destination.clone(),
        destination: Some(valid.destination),
        start_date: valid.start_date.map(|d| d.to_string()),
        end_date: valid.end_date.map(|d| d.to_string()),
        budget: valid.budget,
        travelers: None,
        status: "planning".to_string(),
        actual_cost: 0.0,
        created_at: db::now(),
    };

    let conn = pool.get()?;
    insert_trip(&conn, &trip)?;
    tracing::info!(trip_id = %trip.id, user_id, "Trip created");
    Ok(trip)
}

pub(crate) fn insert_trip(conn: &rusqlite::Connection, trip: &Trip) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO trips (id, user_id, title, destination, start_date, end_date, budget, travelers, status, actual_cost, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            trip.id,
            trip.user_id,
            trip.title,
            trip.destination,
            trip.start_date,
            trip.end_date,
            trip.budget,
            trip.travelers,
            trip.status,
            trip.actual_cost,
            trip.created_at
        ],
    )?;
    Ok(())
}

/// Newest first, at most `limit`.
pub fn recent_trips(pool: &DbPool, user_id: &str, limit: usize) -> AppResult<Vec<Trip>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM trips WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        Trip::COLUMNS
    ))?;
    let rows = stmt.query_map(rusqlite::params![user_id, limit as i64], Trip::from_row)?;
    let trips: Result<Vec<_>, _> = rows.collect();
    Ok(trips?)
}

/// Every trip, latest start date first; undated trips last.
pub fn all_trips(pool: &DbPool, user_id: &str) -> AppResult<Vec<Trip>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM trips WHERE user_id = ?1 ORDER BY start_date DESC, created_at DESC",
        Trip::COLUMNS
    ))?;
    let rows = stmt.query_map(rusqlite::params![user_id], Trip::from_row)?;
    let trips: Result<Vec<_>, _> = rows.collect();
    Ok(trips?)
}

/// The trip, but only if `user_id` owns it. Someone else's trip and a
/// missing trip look the same.
pub fn find_owned(pool: &DbPool, user_id: &str, trip_id: &str) -> AppResult<Option<Trip>> {
    let conn = pool.get()?;
    let result = conn.query_row(
        &format!("SELECT {} FROM trips WHERE id = ?1 AND user_id = ?2", Trip::COLUMNS),
        rusqlite::params![trip_id, user_id],
        Trip::from_row,
    );
    match result {
        Ok(trip) => Ok(Some(trip)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_trips: usize,
    pub upcoming_trips: usize,
    pub total_spent: f64,
    pub favorite_destination: String,
}

impl DashboardStats {
    pub fn from_trips(trips: &[Trip]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for destination in trips.iter().filter_map(|t| t.destination.as_deref()) {
            *counts.entry(destination).or_default() += 1;
        }
        // Ties go to the alphabetically first destination so the answer is stable.
        let favorite = counts
            .into_iter()
            .max_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "Not set".to_string());

        Self {
            total_trips: trips.len(),
            upcoming_trips: trips.iter().filter(|t| t.status != "completed").count(),
            total_spent: trips.iter().map(|t| t.actual_cost).sum(),
            favorite_destination: favorite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::accounts::{self, Registration};

    fn user(pool: &DbPool, email: &str) -> String {
        accounts::register(
            pool,
            &Registration {
                email: email.into(),
                password: "password123".into(),
                confirm_password: "password123".into(),
                first_name: "T".into(),
                last_name: "U".into(),
                terms_accepted: true,
            },
        )
        .unwrap()
        .id
    }

    fn form(destination: &str, start: Option<&str>) -> NewTrip {
        NewTrip {
            destination: destination.into(),
            start_date: start.map(String::from),
            end_date: None,
            budget: Some("1500".into()),
        }
    }

    #[test]
    fn validation_collects_problems() {
        let bad = NewTrip {
            destination: " ".into(),
            start_date: Some("2024-05-10".into()),
            end_date: Some("2024-05-01".into()),
            budget: Some("-3".into()),
        };
        match bad.validate() {
            Err(AppError::Validation(problems)) => assert_eq!(
                problems,
                vec![
                    "Destination is required",
                    "End date cannot be before start date",
                    "Budget must be a non-negative number",
                ]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }

        let bad_date = NewTrip {
            destination: "Lisbon".into(),
            start_date: Some("next tuesday".into()),
            ..Default::default()
        };
        assert!(bad_date.validate().is_err());
    }

    #[test]
    fn recent_trips_are_capped_and_newest_first() {
        let (_dir, pool) = db::test_pool();
        let owner = user(&pool, "owner@example.com");
        for i in 0..7 {
            create_trip(&pool, &owner, &form(&format!("City {i}"), None)).unwrap();
        }

        let recent = recent_trips(&pool, &owner, RECENT_TRIPS_LIMIT).unwrap();
        assert_eq!(recent.len(), RECENT_TRIPS_LIMIT);
        assert!(recent.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(recent[0].destination.as_deref(), Some("City 6"));
    }

    #[test]
    fn all_trips_sorted_by_start_date_desc() {
        let (_dir, pool) = db::test_pool();
        let owner = user(&pool, "owner@example.com");
        create_trip(&pool, &owner, &form("Oslo", Some("2025-01-10"))).unwrap();
        create_trip(&pool, &owner, &form("Undated", None)).unwrap();
        create_trip(&pool, &owner, &form("Lima", Some("2025-06-01"))).unwrap();

        let names: Vec<_> = all_trips(&pool, &owner)
            .unwrap()
            .into_iter()
            .map(|t| t.destination.unwrap())
            .collect();
        assert_eq!(names, vec!["Lima", "Oslo", "Undated"]);
    }

    #[test]
    fn trips_are_private_to_their_owner() {
        let (_dir, pool) = db::test_pool();
        let owner = user(&pool, "owner@example.com");
        let other = user(&pool, "other@example.com");
        let trip = create_trip(&pool, &owner, &form("Quito", None)).unwrap();

        assert!(find_owned(&pool, &owner, &trip.id).unwrap().is_some());
        assert!(find_owned(&pool, &other, &trip.id).unwrap().is_none());
        assert!(all_trips(&pool, &other).unwrap().is_empty());
    }

    #[test]
    fn stats_summarize_trips() {
        let (_dir, pool) = db::test_pool();
        let owner = user(&pool, "owner@example.com");
        assert_eq!(DashboardStats::from_trips(&[]).favorite_destination, "Not set");

        let mut a = create_trip(&pool, &owner, &form("Rome", None)).unwrap();
        a.actual_cost = 100.0;
        a.status = "completed".into();
        let mut b = create_trip(&pool, &owner, &form("Rome", None)).unwrap();
        b.actual_cost = 50.5;
        let c = create_trip(&pool, &owner, &form("Cairo", None)).unwrap();

        let stats = DashboardStats::from_trips(&[a, b, c]);
        assert_eq!(stats.total_trips, 3);
        assert_eq!(stats.upcoming_trips, 2);
        assert_eq!(stats.total_spent, 150.5);
        assert_eq!(stats.favorite_destination, "Rome");
    }
}
