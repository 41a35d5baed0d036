//! Pricing calculator for checkout.

use crate::money::Money;
use crate::order::{CupSize, OrderItem, Product, ShippingMethod};

/// Surcharge added to the unit price for a large cup.
pub const LARGE_CUP_SURCHARGE: Money = Money::new(5_000);

/// Subtotal slice that earns one batch of points.
pub const POINTS_EARN_STEP: i64 = 20_000;

/// Points earned per full [`POINTS_EARN_STEP`] of subtotal.
pub const POINTS_PER_STEP: i64 = 100;

/// Resolves the unit price for a product and cup size.
///
/// Sale price wins over list price when present; the large cup adds a
/// fixed surcharge on top.
pub fn resolve_unit_price(product: &Product, size: CupSize) -> Money {
    let base = product.sale_price.unwrap_or(product.price);
    match size {
        CupSize::Regular => base,
        CupSize::Large => base + LARGE_CUP_SURCHARGE,
    }
}

/// The full price breakdown of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub voucher_discount: Money,
    pub points_used: i64,
    pub points_earned: i64,
    pub total: Money,
}

impl Pricing {
    /// Computes the breakdown for a set of priced items.
    ///
    /// The caller rejects empty item lists before pricing; points and
    /// voucher discount are validated by the caller as well (the store
    /// re-checks both inside the commit transaction).
    pub fn compute(
        items: &[OrderItem],
        shipping: ShippingMethod,
        points_used: i64,
        voucher_discount: Money,
    ) -> Pricing {
        let subtotal: Money = items.iter().map(OrderItem::line_total).sum();
        let shipping_fee = shipping.fee();

        // Points are earned on the subtotal only, never on shipping.
        let points_earned = subtotal.amount() / POINTS_EARN_STEP * POINTS_PER_STEP;

        // 1 point redeems 1 currency unit.
        let total = (subtotal + shipping_fee - Money::new(points_used) - voucher_discount)
            .clamp_non_negative();

        Pricing {
            subtotal,
            shipping_fee,
            voucher_discount,
            points_used,
            points_earned,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use crate::order::{IceLevel, SugarLevel};

    fn item(quantity: u32, unit_price: i64) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(),
            product_name: "Jasmine Green Tea".to_string(),
            quantity,
            unit_price: Money::new(unit_price),
            size: CupSize::Regular,
            ice: IceLevel::Normal,
            sugar: SugarLevel::Normal,
            notes: None,
        }
    }

    fn product(price: i64, sale_price: Option<i64>) -> Product {
        Product {
            id: ProductId::new(),
            name: "Jasmine Green Tea".to_string(),
            price: Money::new(price),
            sale_price: sale_price.map(Money::new),
            stock: 10,
            sold: 0,
        }
    }

    #[test]
    fn test_sale_price_wins_over_list_price() {
        let p = product(50_000, Some(42_000));
        assert_eq!(resolve_unit_price(&p, CupSize::Regular), Money::new(42_000));
    }

    #[test]
    fn test_list_price_without_sale() {
        let p = product(50_000, None);
        assert_eq!(resolve_unit_price(&p, CupSize::Regular), Money::new(50_000));
    }

    #[test]
    fn test_large_cup_surcharge() {
        let p = product(50_000, Some(42_000));
        assert_eq!(resolve_unit_price(&p, CupSize::Large), Money::new(47_000));
    }

    #[test]
    fn test_standard_order_earns_points() {
        // Subtotal 100,000, standard shipping, nothing redeemed:
        // total 110,000 and 500 points earned.
        let pricing = Pricing::compute(
            &[item(2, 50_000)],
            ShippingMethod::Standard,
            0,
            Money::zero(),
        );

        assert_eq!(pricing.subtotal, Money::new(100_000));
        assert_eq!(pricing.shipping_fee, Money::new(10_000));
        assert_eq!(pricing.total, Money::new(110_000));
        assert_eq!(pricing.points_earned, 500);
    }

    #[test]
    fn test_points_redemption_reduces_total() {
        let pricing = Pricing::compute(
            &[item(2, 50_000)],
            ShippingMethod::Standard,
            50_000,
            Money::zero(),
        );

        assert_eq!(pricing.total, Money::new(60_000));
        assert_eq!(pricing.points_used, 50_000);
    }

    #[test]
    fn test_points_earned_floor_division() {
        // 119,999 subtotal is five full steps of 20,000.
        let pricing = Pricing::compute(
            &[item(1, 119_999)],
            ShippingMethod::Standard,
            0,
            Money::zero(),
        );
        assert_eq!(pricing.points_earned, 500);

        // Shipping never earns points.
        let small = Pricing::compute(&[item(1, 19_999)], ShippingMethod::Express, 0, Money::zero());
        assert_eq!(small.points_earned, 0);
    }

    #[test]
    fn test_total_clamped_at_zero() {
        let pricing = Pricing::compute(
            &[item(1, 30_000)],
            ShippingMethod::Standard,
            100_000,
            Money::zero(),
        );
        assert_eq!(pricing.total, Money::zero());
    }

    #[test]
    fn test_voucher_discount_applies_to_total() {
        let pricing = Pricing::compute(
            &[item(6, 50_000)],
            ShippingMethod::Standard,
            0,
            Money::new(20_000),
        );
        // 300,000 + 10,000 - 20,000
        assert_eq!(pricing.total, Money::new(290_000));
    }
}
