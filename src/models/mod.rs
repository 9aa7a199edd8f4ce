pub mod chat;
pub mod conversation;
