pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod progress;
pub mod seed;
pub mod server;
pub mod source;
pub mod store;
pub mod tracker;
