//! Loyalty point ledger types.
//!
//! A user's balance is always the sum of their ledger amounts; the ledger
//! itself is append-only. Earn credits are applied by the lifecycle engine
//! on the first transition out of `pending`, debits at commit time, and
//! refunds/reversals on cancellation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two kinds of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyKind {
    /// Points credited to the balance (earning and refunds).
    Earned,
    /// Points taken from the balance (redemption and reversals).
    Used,
}

impl LoyaltyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoyaltyKind::Earned => "earned",
            LoyaltyKind::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<LoyaltyKind> {
        match s {
            "earned" => Some(LoyaltyKind::Earned),
            "used" => Some(LoyaltyKind::Used),
            _ => None,
        }
    }
}

/// An immutable ledger entry recording one balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: LoyaltyKind,
    /// Signed amount: positive for `Earned`, negative for `Used`.
    pub amount: i64,
    /// The order that earned or consumed the points, when applicable.
    pub order_id: Option<OrderId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LoyaltyTransaction {
    /// Builds an entry, deriving the sign of `amount` from `kind`.
    pub fn new(
        user_id: UserId,
        kind: LoyaltyKind,
        points: i64,
        order_id: Option<OrderId>,
        description: impl Into<String>,
    ) -> Self {
        let amount = match kind {
            LoyaltyKind::Earned => points.abs(),
            LoyaltyKind::Used => -points.abs(),
        };
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            order_id,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earned_entries_are_positive() {
        let tx = LoyaltyTransaction::new(
            UserId::new(),
            LoyaltyKind::Earned,
            500,
            Some(OrderId::new()),
            "Points earned from order ORD-20260805-ABC123",
        );
        assert_eq!(tx.amount, 500);
    }

    #[test]
    fn test_used_entries_are_negative() {
        let tx = LoyaltyTransaction::new(
            UserId::new(),
            LoyaltyKind::Used,
            20_000,
            Some(OrderId::new()),
            "Redeemed points",
        );
        assert_eq!(tx.amount, -20_000);
    }

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in [LoyaltyKind::Earned, LoyaltyKind::Used] {
            assert_eq!(LoyaltyKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LoyaltyKind::parse("spent"), None);
    }

    #[test]
    fn test_balance_is_ledger_sum() {
        let user = UserId::new();
        let entries = [
            LoyaltyTransaction::new(user, LoyaltyKind::Earned, 500, None, "earn"),
            LoyaltyTransaction::new(user, LoyaltyKind::Used, 200, None, "use"),
            LoyaltyTransaction::new(user, LoyaltyKind::Earned, 100, None, "refund"),
        ];
        let balance: i64 = entries.iter().map(|t| t.amount).sum();
        assert_eq!(balance, 400);
    }
}
