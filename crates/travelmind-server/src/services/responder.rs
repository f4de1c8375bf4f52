//! Assistant replies for the trip chat.
//!
//! Handlers only see [`ResponseStrategy`]; the shipped implementation is a
//! fixed keyword table.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Trip, TripPatch};

/// What the assistant says back, plus any trip fields it wants to set.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    pub trip_patch: Option<TripPatch>,
}

#[async_trait]
pub trait ResponseStrategy: Send + Sync {
    /// Answers the latest user message about `trip`. Implementations see the
    /// trip as stored before this exchange.
    async fn respond(&self, text: &str, trip: &Trip) -> AppResult<Reply>;
}

pub const JAPAN_REPLY: &str = "Excellent choice! Japan is magical, especially during cherry blossom season. I've drafted \"Tokyo Adventure\", a preliminary plan covering Tokyo and Kyoto with traditional experiences like a ryokan stay, ancient temples and incredible food.

Your trip includes:
🏯 Temple visits in Kyoto
🍣 Authentic sushi experiences
🌸 Cherry blossom viewing
🏨 A mix of traditional and modern accommodation
🚅 A bullet train ride

Would you like me to adjust the budget, add more cities, or focus on specific activities?";

pub const BEACH_REPLY: &str = "A tropical beach getaway sounds perfect! 🏖️ Bali, Thailand and the Philippines all offer beautiful beaches, rich culture and excellent value for money.

**Bali, Indonesia** would be great for:
• Stunning beaches in Uluwatu and Seminyak
• Cultural experiences in Ubud
• Delicious local cuisine
• Affordable luxury accommodation

Shall I build a detailed itinerary for Bali, or would you rather explore other tropical destinations?";

pub const ITALY_REPLY: &str = "Fantastico! A culinary journey through Italy is unforgettable! 🍝 Here is a food-focused route through the country's most delicious regions.

**Your Italian Food Adventure:**
• Rome: traditional carbonara and supplì
• Florence: bistecca alla fiorentina and Chianti
• Bologna: fresh pasta and mortadella
• Naples: authentic pizza and sfogliatelle

We can add cooking classes, wine tastings, market tours and trattorias tourists rarely find. What's your budget range and how many days are you thinking?";

pub const DEFAULT_REPLY: &str = "That sounds great! I'd love to help you plan this trip. To create the perfect itinerary, could you tell me a bit more about:

• Your preferred travel dates
• The budget range you're comfortable with
• What type of experiences excite you most
• How many people will be traveling

The more details you share, the better I can tailor your adventure! ✈️";

/// Keyword lookup in priority order; the first matching row wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedResponder;

impl CannedResponder {
    pub fn reply_for(text: &str) -> Reply {
        let lower = text.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if mentions(&["japan", "tokyo"]) {
            Reply {
                content: JAPAN_REPLY.to_string(),
                trip_patch: Some(tokyo_adventure()),
            }
        } else if mentions(&["beach", "tropical"]) {
            Reply { content: BEACH_REPLY.to_string(), trip_patch: None }
        } else if mentions(&["italy", "food"]) {
            Reply { content: ITALY_REPLY.to_string(), trip_patch: None }
        } else {
            Reply { content: DEFAULT_REPLY.to_string(), trip_patch: None }
        }
    }
}

#[async_trait]
impl ResponseStrategy for CannedResponder {
    async fn respond(&self, text: &str, _trip: &Trip) -> AppResult<Reply> {
        Ok(Self::reply_for(text))
    }
}

fn tokyo_adventure() -> TripPatch {
    TripPatch {
        title: Some("Tokyo Adventure".to_string()),
        destination: Some("Tokyo, Japan".to_string()),
        start_date: Some("2024-04-15".to_string()),
        end_date: Some("2024-04-20".to_string()),
        travelers: Some(2),
        budget: Some(3500.0),
        actual_cost: Some(2850.0),
    }
}
