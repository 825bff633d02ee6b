pub mod api;
pub mod commentary;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod terminal;

pub use commentary::{
    CommentaryError, CommentaryProvider, HttpCommentaryProvider, MockCommentaryProvider,
    NewsProvider,
};
pub use config::Config;
pub use db::{init_db, PreferencesStore};
pub use domain::{Decimal, InstrumentId, Order, OrderId, OrderStatus, Side, TimeMs};
pub use error::{AppError, CommandError};
pub use terminal::{PlaceOrder, Simulator, TerminalController, TerminalHandle};
