pub mod message;
pub mod models;
