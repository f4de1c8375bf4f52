use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{Message, Sender, Trip};
use crate::services::responder::ResponseStrategy;
use crate::services::trips;

#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub trip: Trip,
    pub user_message: Message,
    pub ai_response: Message,
}

/// Conversation for a trip, oldest first.
pub fn list_messages(pool: &DbPool, trip_id: &str) -> AppResult<Vec<Message>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, trip_id, sender, content, timestamp, message_type
         FROM messages WHERE trip_id = ?1 ORDER BY timestamp, rowid",
    )?;
    let rows = stmt.query_map(rusqlite::params![trip_id], |row| {
        let sender: String = row.get(2)?;
        let sender = Sender::parse(&sender).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown sender {sender:?}").into(),
            )
        })?;
        Ok(Message {
            id: row.get(0)?,
            trip_id: row.get(1)?,
            sender,
            content: row.get(3)?,
            timestamp: row.get(4)?,
            message_type: row.get(5)?,
        })
    })?;
    let messages: Result<Vec<_>, _> = rows.collect();
    Ok(messages?)
}

/// Posts `text` to a trip's conversation and records the assistant's answer.
///
/// Without `trip_id` a fresh "New Trip" is started for the user. A `trip_id`
/// the user does not own is reported as not found. All writes for the
/// exchange commit together.
pub async fn send_message(
    pool: &DbPool,
    responder: &dyn ResponseStrategy,
    user_id: &str,
    text: &str,
    trip_id: Option<&str>,
) -> AppResult<Exchange> {
    if text.trim().is_empty() {
        return Err(AppError::validation("Message cannot be empty"));
    }

    let (mut trip, is_new) = match trip_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            let trip = trips::find_owned(pool, user_id, id)?
                .ok_or_else(|| AppError::NotFound("Trip not found".into()))?;
            (trip, false)
        }
        None => (new_trip(user_id), true),
    };

    let user_message = Message::new(&trip.id, Sender::User, text);
    let reply = responder.respond(text, &trip).await?;
    if let Some(patch) = &reply.trip_patch {
        patch.apply(&mut trip);
    }
    let ai_response = Message::new(&trip.id, Sender::Ai, reply.content);

    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    if is_new {
        trips::insert_trip(&tx, &trip)?;
    }
    insert_message(&tx, &user_message)?;
    if reply.trip_patch.is_some() {
        tx.execute(
            "UPDATE trips
             SET title = ?1, destination = ?2, start_date = ?3, end_date = ?4,
                 budget = ?5, travelers = ?6, actual_cost = ?7
             WHERE id = ?8 AND user_id = ?9",
            rusqlite::params![
                trip.title,
                trip.destination,
                trip.start_date,
                trip.end_date,
                trip.budget,
                trip.travelers,
                trip.actual_cost,
                trip.id,
                user_id
            ],
        )?;
    }
    insert_message(&tx, &ai_response)?;
    tx.commit()?;

    tracing::debug!(trip_id = %trip.id, new_trip = is_new, "Chat exchange stored");

    Ok(Exchange { trip, user_message, ai_response })
}

fn new_trip(user_id: &str) -> Trip {
    Trip {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: "New Trip".to_string(),
        destination: None,
        start_date: None,
        end_date: None,
        budget: None,
        travelers: None,
        status: "planning".to_string(),
        actual_cost: 0.0,
        created_at: db::now(),
    }
}

fn insert_message(conn: &rusqlite::Connection, message: &Message) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO messages (id, trip_id, sender, content, message_type, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            message.id,
            message.trip_id,
            message.sender.as_str(),
            message.content,
            message.message_type,
            message.timestamp
        ],
    )?;
    Ok(())
}
