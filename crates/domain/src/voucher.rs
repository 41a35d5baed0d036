//! Voucher validation and discount computation.

use chrono::{DateTime, Utc};
use common::VoucherId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// How a voucher's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is a flat amount.
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<DiscountKind> {
        match s {
            "percentage" => Some(DiscountKind::Percentage),
            "fixed" => Some(DiscountKind::Fixed),
            _ => None,
        }
    }
}

/// A discount voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    /// Stored upper-case; matched case-insensitively via [`normalize_code`].
    pub code: String,
    pub kind: DiscountKind,
    /// Percent for [`DiscountKind::Percentage`], flat amount otherwise.
    pub value: i64,
    pub min_order_amount: Option<Money>,
    pub max_discount_amount: Option<Money>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Total redemption cap across all users; None means unlimited.
    pub usage_limit: Option<i32>,
    pub used_count: i32,
}

/// Why a voucher was not applied.
///
/// A rejected voucher never fails the checkout; it is dropped with zero
/// discount and the reason is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoucherRejection {
    NotYetActive,
    Expired,
    UsageLimitReached,
    BelowMinimum { minimum: Money, subtotal: Money },
}

impl std::fmt::Display for VoucherRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoucherRejection::NotYetActive => write!(f, "voucher is not yet active"),
            VoucherRejection::Expired => write!(f, "voucher has expired"),
            VoucherRejection::UsageLimitReached => write!(f, "voucher usage limit reached"),
            VoucherRejection::BelowMinimum { minimum, subtotal } => write!(
                f,
                "order subtotal {subtotal} is below the voucher minimum {minimum}"
            ),
        }
    }
}

/// Normalizes a user-supplied voucher code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Voucher {
    /// Validates this voucher against the clock, its usage cap, and the
    /// order subtotal, returning the discount it grants.
    pub fn evaluate(&self, subtotal: Money, now: DateTime<Utc>) -> Result<Money, VoucherRejection> {
        if now < self.starts_at {
            return Err(VoucherRejection::NotYetActive);
        }
        if now > self.ends_at {
            return Err(VoucherRejection::Expired);
        }
        if let Some(limit) = self.usage_limit
            && self.used_count >= limit
        {
            return Err(VoucherRejection::UsageLimitReached);
        }
        if let Some(minimum) = self.min_order_amount
            && subtotal < minimum
        {
            return Err(VoucherRejection::BelowMinimum {
                minimum,
                subtotal,
            });
        }

        Ok(self.discount_for(subtotal))
    }

    /// Computes the discount amount for a subtotal, without validity checks.
    ///
    /// Percentage discounts floor the division and honor the cap; fixed
    /// discounts never exceed the subtotal, so the result is never
    /// negative by construction.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => {
                let raw = Money::new(subtotal.amount() * self.value / 100);
                match self.max_discount_amount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountKind::Fixed => Money::new(self.value).min(subtotal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn voucher(kind: DiscountKind, value: i64) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: VoucherId::new(),
            code: "SAVE10".to_string(),
            kind,
            value,
            min_order_amount: None,
            max_discount_amount: None,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            usage_limit: None,
            used_count: 0,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
        assert_eq!(normalize_code("Save10"), "SAVE10");
    }

    #[test]
    fn test_percentage_discount_capped() {
        // 10% of 300,000 is 30,000, capped to 20,000.
        let mut v = voucher(DiscountKind::Percentage, 10);
        v.max_discount_amount = Some(Money::new(20_000));

        assert_eq!(v.discount_for(Money::new(300_000)), Money::new(20_000));
    }

    #[test]
    fn test_percentage_discount_uncapped_floors() {
        let v = voucher(DiscountKind::Percentage, 15);
        // 15% of 99,999 = 14,999.85, floored.
        assert_eq!(v.discount_for(Money::new(99_999)), Money::new(14_999));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let v = voucher(DiscountKind::Fixed, 50_000);
        assert_eq!(v.discount_for(Money::new(30_000)), Money::new(30_000));
        assert_eq!(v.discount_for(Money::new(80_000)), Money::new(50_000));
    }

    #[test]
    fn test_evaluate_respects_window() {
        let now = Utc::now();
        let mut v = voucher(DiscountKind::Fixed, 10_000);

        v.starts_at = now + Duration::hours(1);
        assert_eq!(
            v.evaluate(Money::new(100_000), now),
            Err(VoucherRejection::NotYetActive)
        );

        v.starts_at = now - Duration::days(2);
        v.ends_at = now - Duration::hours(1);
        assert_eq!(
            v.evaluate(Money::new(100_000), now),
            Err(VoucherRejection::Expired)
        );
    }

    #[test]
    fn test_evaluate_respects_usage_cap() {
        let mut v = voucher(DiscountKind::Fixed, 10_000);
        v.usage_limit = Some(3);
        v.used_count = 3;

        assert_eq!(
            v.evaluate(Money::new(100_000), Utc::now()),
            Err(VoucherRejection::UsageLimitReached)
        );
    }

    #[test]
    fn test_evaluate_respects_minimum() {
        let mut v = voucher(DiscountKind::Fixed, 10_000);
        v.min_order_amount = Some(Money::new(150_000));

        let err = v.evaluate(Money::new(100_000), Utc::now()).unwrap_err();
        assert!(matches!(err, VoucherRejection::BelowMinimum { .. }));

        assert_eq!(
            v.evaluate(Money::new(150_000), Utc::now()),
            Ok(Money::new(10_000))
        );
    }
}
