pub mod auth;
pub mod client;
pub mod endpoint;
pub mod instructor;
pub mod models;
pub mod profile;
pub mod search;
