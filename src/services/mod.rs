pub mod cart;
pub mod catalog;
pub mod chat;
pub mod chat_live;
pub mod checkout;
