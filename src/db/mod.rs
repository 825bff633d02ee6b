//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The preferences store (profile, broker, favorites, chart layouts)

pub mod migrations;
pub mod preferences;

pub use migrations::init_db;
pub use preferences::{AccountState, PreferencesStore};
