//! Domain types for the paper-trading terminal.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Primitives: TimeMs, InstrumentId, OrderId, Side, OrderMode, OrderStatus
//! - Instruments and the default catalog
//! - Orders, transfer records, and user preferences

pub mod decimal;
pub mod instrument;
pub mod order;
pub mod preferences;
pub mod primitives;
pub mod transfer;

pub use decimal::Decimal;
pub use instrument::{default_catalog, Category, Instrument};
pub use order::{Order, Protection};
pub use preferences::{
    BrokerAccount, BrokerStatus, ChartLayout, Favorites, TraderLevel, UserProfile,
};
pub use primitives::{InstrumentId, OrderId, OrderMode, OrderStatus, Side, TimeMs};
pub use transfer::{TransferKind, TransferRecord, TransferStatus};
