pub mod config;
pub mod debounce;
pub mod dto;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;
