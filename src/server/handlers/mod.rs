pub mod config;
pub mod embeddings;
pub mod health;
pub mod query;
