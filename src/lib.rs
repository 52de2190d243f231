pub mod api;
pub mod config;
pub mod enqueue;
pub mod executor;
pub mod search;
