//! User-facing preferences: profile, broker connection, favorites, chart layouts.
//!
//! These are stored as JSON documents by [`crate::db::PreferencesStore`]; the
//! simulator never reads them.

use crate::domain::{Decimal, InstrumentId, TimeMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraderLevel {
    Novice,
    Intermediate,
    Pro,
    Whale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub avatar: String,
    pub level: TraderLevel,
    pub joined_at: TimeMs,
}

impl UserProfile {
    /// A new trader profile with a generated avatar.
    pub fn novice(name: &str, joined_at: TimeMs) -> Self {
        let name = name.trim().to_string();
        Self {
            avatar: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", name),
            name,
            level: TraderLevel::Novice,
            joined_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrokerStatus {
    Connected,
    Disconnected,
    Verifying,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerAccount {
    pub broker_id: String,
    pub name: String,
    pub status: BrokerStatus,
    /// Simulated round-trip latency in milliseconds.
    pub ping: u32,
    pub server_location: String,
}

/// Static description of a selectable broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerListing {
    pub broker_id: &'static str,
    pub name: &'static str,
    pub server_location: &'static str,
}

pub const BROKER_CATALOG: [BrokerListing; 4] = [
    BrokerListing {
        broker_id: "brk-1",
        name: "Nexus Prime",
        server_location: "New York (AWS-US-1)",
    },
    BrokerListing {
        broker_id: "brk-2",
        name: "Apex Liquidity",
        server_location: "London (LSE-Hub)",
    },
    BrokerListing {
        broker_id: "brk-3",
        name: "Zenith Exchange",
        server_location: "Tokyo (TSE-Direct)",
    },
    BrokerListing {
        broker_id: "brk-4",
        name: "Iron Cloud Trading",
        server_location: "Frankfurt (Equinix-FR2)",
    },
];

pub fn find_broker(broker_id: &str) -> Option<&'static BrokerListing> {
    BROKER_CATALOG.iter().find(|b| b.broker_id == broker_id)
}

impl BrokerListing {
    pub fn connect(&self, ping: u32) -> BrokerAccount {
        BrokerAccount {
            broker_id: self.broker_id.to_string(),
            name: self.name.to_string(),
            status: BrokerStatus::Connected,
            ping,
            server_location: self.server_location.to_string(),
        }
    }
}

/// Favorited instruments, kept in insertion order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(pub Vec<InstrumentId>);

impl Favorites {
    /// Add the instrument if absent, remove it otherwise. Returns the new membership.
    pub fn toggle(&mut self, id: &InstrumentId) -> bool {
        if let Some(pos) = self.0.iter().position(|f| f == id) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(id.clone());
            true
        }
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.0.contains(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartTheme {
    Default,
    Neon,
    Cyber,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorToggles {
    pub sma: bool,
    pub ema: bool,
    pub rsi: bool,
    pub volume: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FibDrawing {
    pub start_price: Decimal,
    pub end_price: Decimal,
}

/// A saved chart configuration. Opaque to the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub id: String,
    pub name: String,
    pub indicators: IndicatorToggles,
    pub show_fib: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_fib: Option<FibDrawing>,
    pub theme: ChartTheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<TimeFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema_period: Option<u32>,
    pub timestamp: TimeMs,
}
