//! Cash transfer ledger events (deposits and withdrawals).

use crate::domain::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Method label used for the opening balance of a fresh terminal.
pub const INITIAL_FUNDING_METHOD: &str = "Institutional Wire";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Completed,
    Pending,
}

/// A deposit/withdrawal ledger event. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: Uuid,
    pub kind: TransferKind,
    /// Unsigned amount; the direction is carried by `kind`.
    pub amount: Decimal,
    pub method: String,
    pub status: TransferStatus,
    pub created_at: TimeMs,
}

impl TransferRecord {
    /// A completed transfer stamped at `created_at`.
    pub fn completed(kind: TransferKind, amount: Decimal, method: &str, created_at: TimeMs) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            method: method.trim().to_string(),
            status: TransferStatus::Completed,
            created_at,
        }
    }

    /// Effect on cash: positive for deposits, negative for withdrawals.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransferKind::Deposit => self.amount,
            TransferKind::Withdrawal => -self.amount,
        }
    }
}
