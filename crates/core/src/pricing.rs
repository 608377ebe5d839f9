//! Charge and settlement amount calculation.
//!
//! All amounts are integers in minor currency units. The platform keeps a
//! flat 10% commission on every line; the remainder is the merchant's
//! settlement.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Platform commission, percent of the charged amount.
const COMMISSION_PERCENT: i64 = 10;

/// The amounts computed for a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// Amount charged to the buyer, in minor currency units.
    pub amount: i64,
    /// Merchant's net receivable after platform commission.
    pub merchant_receive: i64,
}

/// Compute the charge and settlement amounts for one cart line.
///
/// Pure function of `(price, discount_percent, quantity)`:
///
/// ```text
/// unit_net         = price - (discount_percent / 100) * price
/// amount           = ceil(unit_net) * quantity
/// merchant_receive = ceil(amount - (10 / 100) * amount)
/// ```
///
/// The ceiling is applied per stage, in exactly this order. Reordering the
/// ceiling application changes settlement totals by rounding, so don't.
///
/// `discount_percent` must be in `0..=100` and `quantity >= 1`; both are
/// enforced upstream at product insert and cart insert.
#[must_use]
pub fn line_amounts(price: i64, discount_percent: u8, quantity: u32) -> LineAmounts {
    debug_assert!(discount_percent <= 100, "discount percent out of range");
    debug_assert!(quantity >= 1, "quantity must be at least 1");

    let price = Decimal::from(price);
    let discount = Decimal::from(discount_percent) / Decimal::from(100) * price;
    let unit_net = price - discount;

    let amount = unit_net.ceil() * Decimal::from(quantity);
    let commission = Decimal::from(COMMISSION_PERCENT) / Decimal::from(100) * amount;
    let merchant_receive = (amount - commission).ceil();

    LineAmounts {
        amount: amount.to_i64().unwrap_or(i64::MAX),
        merchant_receive: merchant_receive.to_i64().unwrap_or(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_example() {
        // price=1000, discount=10%, quantity=2:
        // unit_net=900, amount=1800, merchant=ceil(1800-180)=1620
        let amounts = line_amounts(1000, 10, 2);
        assert_eq!(amounts.amount, 1800);
        assert_eq!(amounts.merchant_receive, 1620);
    }

    #[test]
    fn unit_net_is_ceiled_before_multiplying() {
        // price=999, discount=33%: unit_net = 669.33, ceil -> 670.
        // Ceiling after multiplying by 3 would give 2008, not 2010.
        let amounts = line_amounts(999, 33, 3);
        assert_eq!(amounts.amount, 2010);
        assert_eq!(amounts.merchant_receive, 1809);
    }

    #[test]
    fn commission_is_ceiled_on_the_total() {
        // amount = 667 * 1 = 667; 667 - 66.7 = 600.3 -> 601
        let amounts = line_amounts(667, 0, 1);
        assert_eq!(amounts.amount, 667);
        assert_eq!(amounts.merchant_receive, 601);
    }

    #[test]
    fn zero_discount_and_full_discount() {
        let full_price = line_amounts(500, 0, 1);
        assert_eq!(full_price.amount, 500);
        assert_eq!(full_price.merchant_receive, 450);

        let free = line_amounts(500, 100, 4);
        assert_eq!(free.amount, 0);
        assert_eq!(free.merchant_receive, 0);
    }

    #[test]
    fn determinism() {
        assert_eq!(line_amounts(123_456, 7, 9), line_amounts(123_456, 7, 9));
    }
}
