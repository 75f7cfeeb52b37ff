//! Totals recomputation over the line-item collection.

use facture_core::{Money, ValueObject};
use serde::{Deserialize, Serialize};

use crate::invoice::LineItem;

/// Tax rate applied to the subtotal, in whole percent. Fixed, not configurable.
pub const TAX_RATE_PERCENT: u32 = 10;

/// Derived aggregate figures: never mutated directly, always recomputed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl ValueObject for Totals {}

/// Recompute `(subtotal, tax, total)` from the line items.
///
/// Deterministic and side-effect-free. Called after every mutation that
/// changes an item amount or the collection membership, before the next read.
/// Item amounts are overflow-checked at the command boundary, so the sums
/// here saturate rather than fail.
pub fn compute(items: &[LineItem]) -> Totals {
    let subtotal = items
        .iter()
        .fold(Money::ZERO, |sum, item| sum.saturating_add(item.amount()));
    let tax = subtotal.percent(TAX_RATE_PERCENT);
    let total = subtotal.saturating_add(tax);

    Totals {
        subtotal,
        tax,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{LineItem, LineItemId};
    use facture_core::EntityId;

    fn item(description: &str, quantity: u32, rate_cents: i64) -> LineItem {
        LineItem::from_parts(
            LineItemId::new(EntityId::new()),
            description.to_string(),
            quantity,
            Money::from_cents(rate_cents),
        )
    }

    #[test]
    fn empty_collection_totals_to_zero() {
        let totals = compute(&[]);
        assert_eq!(totals.subtotal, Money::ZERO);
        assert_eq!(totals.tax, Money::ZERO);
        assert_eq!(totals.total, Money::ZERO);
    }

    #[test]
    fn single_item_scenario() {
        // quantity 3 at $50.00 -> $150.00 / $15.00 / $165.00
        let totals = compute(&[item("consulting", 3, 5000)]);
        assert_eq!(totals.subtotal, Money::from_major(150));
        assert_eq!(totals.tax, Money::from_major(15));
        assert_eq!(totals.total, Money::from_major(165));
    }

    #[test]
    fn multiple_items_sum_before_tax() {
        // (1 x $100.00) + (2 x $25.00) -> $150.00 / $15.00 / $165.00
        let totals = compute(&[item("design", 1, 10000), item("hosting", 2, 2500)]);
        assert_eq!(totals.subtotal, Money::from_major(150));
        assert_eq!(totals.tax, Money::from_major(15));
        assert_eq!(totals.total, Money::from_major(165));
    }

    #[test]
    fn tax_rounds_half_up_on_odd_subtotals() {
        // $1.55 subtotal -> 15.5 cents of tax -> $0.16
        let totals = compute(&[item("widget", 1, 155)]);
        assert_eq!(totals.tax, Money::from_cents(16));
        assert_eq!(totals.total, Money::from_cents(171));
    }
}
