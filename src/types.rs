pub mod catalog;
pub mod chat;
pub mod push;
