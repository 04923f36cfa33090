//! # godrive-core
//!
//! Client core for the GoDrive driving-instructor marketplace.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use godrive_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> godrive_core::Result<()> {
//!     let config = Config::load(None)?;
//!     let store = ClientStore::new();
//!     let client = GoDriveClient::new(config.client_config(None)?, store)?;
//!     let state = ServerState::new(client);
//!
//!     let results = state.search_instructors(&SearchInstructors::default()).await;
//!     for instructor in results.into_result()?.instructors {
//!         println!("{} {}", instructor.name, format_price(instructor.price_per_lesson));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           API Layer                 │  HTTP adapter, typed endpoints, models
//! ├─────────────────────────────────────┤
//! │          Core Layer                 │  Query cache, server state, client store
//! ├─────────────────────────────────────┤
//! │        Storage Layer                │  Config file, keyring session
//! ├─────────────────────────────────────┤
//! │         Utils Layer                 │  Validation, text, logging
//! └─────────────────────────────────────┘
//! ```

pub use error::AppError;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Result;
    pub use crate::error::{ApiError, AppError};

    pub use crate::api::client::{ClientConfig, GoDriveClient};
    pub use crate::api::models::{
        InstructorProfile, InstructorSummary, LicenseCategory, Location, Review, Session,
        StudentProfile, User,
    };
    pub use crate::api::search::SearchInstructors;

    pub use crate::core::query::{FetchStatus, QueryKey, QueryState};
    pub use crate::core::server_state::ServerState;
    pub use crate::core::session::ClientStore;

    pub use crate::storage::config::Config;
    pub use crate::storage::credentials::KeyringSessionStorage;

    pub use crate::display::{TableDisplay, format_price};
}

/// HTTP adapter, typed endpoints and response models.
pub mod api;

/// Query cache, server-state queries/mutations and the local client store.
pub mod core;

/// Configuration file and session persistence.
pub mod storage;

/// Validation, text and logging helpers.
pub mod utils;

/// Formatting and terminal tables.
pub mod display;

/// Error taxonomy with severity levels and troubleshooting hints.
pub mod error;

/// Convenient Result type alias using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
