use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub timezone: String,
    pub preferred_currency: String,
    pub preferences: serde_json::Map<String, serde_json::Value>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login: Option<String>,
}

impl User {
    /// Column list matching [`User::from_row`].
    pub const COLUMNS: &'static str = "id, email, first_name, last_name, password_hash, phone, timezone, preferred_currency, preferences, is_active, created_at, updated_at, last_login";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }

    /// Reads [`User::COLUMNS`] starting at column `offset`, for joins that
    /// select other columns first.
    pub fn from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let preferences: String = row.get(offset + 8)?;
        Ok(User {
            id: row.get(offset)?,
            email: row.get(offset + 1)?,
            first_name: row.get(offset + 2)?,
            last_name: row.get(offset + 3)?,
            password_hash: row.get(offset + 4)?,
            phone: row.get(offset + 5)?,
            timezone: row.get(offset + 6)?,
            preferred_currency: row.get(offset + 7)?,
            preferences: serde_json::from_str(&preferences).unwrap_or_default(),
            is_active: row.get(offset + 9)?,
            created_at: row.get(offset + 10)?,
            updated_at: row.get(offset + 11)?,
            last_login: row.get(offset + 12)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub timezone: String,
    pub preferred_currency: String,
    pub preferences: serde_json::Map<String, serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
    pub last_login: Option<String>,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone: u.phone,
            timezone: u.timezone,
            preferred_currency: u.preferred_currency,
            preferences: u.preferences,
            created_at: u.created_at,
            updated_at: u.updated_at,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub remember: bool,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub travelers: Option<i64>,
    pub status: String,
    pub actual_cost: f64,
    pub created_at: String,
}

impl Trip {
    pub const COLUMNS: &'static str = "id, user_id, title, destination, start_date, end_date, budget, travelers, status, actual_cost, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Trip {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            destination: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            budget: row.get(6)?,
            travelers: row.get(7)?,
            status: row.get(8)?,
            actual_cost: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

/// Fields a responder may overwrite on a trip. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripPatch {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub travelers: Option<i64>,
    pub budget: Option<f64>,
    pub actual_cost: Option<f64>,
}

impl TripPatch {
    pub fn apply(&self, trip: &mut Trip) {
        if let Some(title) = &self.title {
            trip.title = title.clone();
        }
        if let Some(destination) = &self.destination {
            trip.destination = Some(destination.clone());
        }
        if let Some(start) = &self.start_date {
            trip.start_date = Some(start.clone());
        }
        if let Some(end) = &self.end_date {
            trip.end_date = Some(end.clone());
        }
        if let Some(travelers) = self.travelers {
            trip.travelers = Some(travelers);
        }
        if let Some(budget) = self.budget {
            trip.budget = Some(budget);
        }
        if let Some(cost) = self.actual_cost {
            trip.actual_cost = cost;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "ai" => Some(Sender::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub trip_id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub message_type: String,
}

impl Message {
    pub fn new(trip_id: &str, sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            trip_id: trip_id.to_string(),
            sender,
            content: content.into(),
            timestamp: crate::db::now(),
            message_type: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_trip() -> Trip {
        Trip {
            id: "t1".into(),
            user_id: "u1".into(),
            title: "New Trip".into(),
            destination: None,
            start_date: None,
            end_date: None,
            budget: None,
            travelers: None,
            status: "planning".into(),
            actual_cost: 0.0,
            created_at: "2024-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut trip = blank_trip();
        let patch = TripPatch {
            destination: Some("Bali, Indonesia".into()),
            budget: Some(1200.0),
            ..Default::default()
        };
        patch.apply(&mut trip);

        assert_eq!(trip.title, "New Trip");
        assert_eq!(trip.destination.as_deref(), Some("Bali, Indonesia"));
        assert_eq!(trip.budget, Some(1200.0));
        assert_eq!(trip.actual_cost, 0.0);
    }

    #[test]
    fn message_serializes_type_and_sender() {
        let msg = Message::new("t1", Sender::Ai, "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "ai");
        assert_eq!(json["type"], "text");
        assert_eq!(Sender::parse("user"), Some(Sender::User));
        assert_eq!(Sender::parse("bot"), None);
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: "u1".into(),
            email: "a@b.c".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            password_hash: "$argon2id$secret".into(),
            phone: None,
            timezone: "UTC".into(),
            preferred_currency: "USD".into(),
            preferences: Default::default(),
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
            last_login: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }
}
