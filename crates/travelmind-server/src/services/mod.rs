pub mod accounts;
pub mod chat;
pub mod responder;
pub mod trips;
