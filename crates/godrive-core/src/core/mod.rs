pub mod auth;
pub mod cache;
pub mod query;
pub mod server_state;
pub mod session;
