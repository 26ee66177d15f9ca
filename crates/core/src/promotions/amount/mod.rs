//! Per-type discount amount strategies.
//!
//! Every strategy receives the targeted lines in cart order and returns one
//! deduction per line it discounts, already rounded half-up to the configured
//! scale. `maxDiscount` is applied here, before stacking.

mod buy_x_get_y;
mod fixed;
mod nth_item;
mod percentage;
mod volume;

use rust_decimal::Decimal;

use crate::domain::cart::{LineItem, LineItemId};
use crate::domain::discount::{Discount, DiscountId, DiscountType};
use crate::promotions::money::{allocate, DEFAULT_ROUNDING_SCALE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineDeduction {
    pub line_item_id: LineItemId,
    pub amount: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountOutcome {
    Computed,
    /// The discount type has a validated contract but no evaluation yet.
    NotImplemented,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscountAmount {
    pub discount_id: DiscountId,
    pub deductions: Vec<LineDeduction>,
    pub total: Decimal,
    pub outcome: AmountOutcome,
}

impl DiscountAmount {
    fn computed(discount: &Discount, deductions: Vec<LineDeduction>) -> Self {
        let deductions: Vec<LineDeduction> =
            deductions.into_iter().filter(|deduction| deduction.amount > Decimal::ZERO).collect();
        let total = deductions.iter().map(|deduction| deduction.amount).sum();
        let discount_id = discount.id.clone();
        Self { discount_id, deductions, total, outcome: AmountOutcome::Computed }
    }

    fn not_implemented(discount: &Discount) -> Self {
        Self {
            discount_id: discount.id.clone(),
            deductions: Vec::new(),
            total: Decimal::ZERO,
            outcome: AmountOutcome::NotImplemented,
        }
    }

    pub fn amount_for(&self, line_item_id: &LineItemId) -> Decimal {
        self.deductions
            .iter()
            .filter(|deduction| &deduction.line_item_id == line_item_id)
            .map(|deduction| deduction.amount)
            .sum()
    }
}

pub trait AmountCalculator: Send + Sync {
    fn calculate(&self, discount: &Discount, lines: &[&LineItem]) -> DiscountAmount;
}

#[derive(Clone, Copy, Debug)]
pub struct DeterministicAmountCalculator {
    rounding_scale: u32,
}

impl Default for DeterministicAmountCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDING_SCALE)
    }
}

impl DeterministicAmountCalculator {
    pub fn new(rounding_scale: u32) -> Self {
        Self { rounding_scale }
    }
}

impl AmountCalculator for DeterministicAmountCalculator {
    fn calculate(&self, discount: &Discount, lines: &[&LineItem]) -> DiscountAmount {
        let scale = self.rounding_scale;
        let deductions = match discount.kind {
            DiscountType::Percentage => percentage::deductions(discount, lines, scale),
            DiscountType::Fixed => fixed::deductions(discount, lines, scale),
            DiscountType::BuyXGetY => buy_x_get_y::deductions(discount, lines, scale),
            DiscountType::NthItemDiscount => nth_item::deductions(discount, lines, scale),
            DiscountType::VolumeDiscount => return volume::evaluate(discount),
        };

        let deductions = match discount.max_discount {
            Some(cap) => apply_cap(deductions, cap, scale),
            None => deductions,
        };
        DiscountAmount::computed(discount, deductions)
    }
}

/// Scales deductions back proportionally so they sum to at most `cap`.
fn apply_cap(deductions: Vec<LineDeduction>, cap: Decimal, scale: u32) -> Vec<LineDeduction> {
    let total: Decimal = deductions.iter().map(|deduction| deduction.amount).sum();
    if total <= cap {
        return deductions;
    }

    let capacities: Vec<Decimal> = deductions.iter().map(|deduction| deduction.amount).collect();
    let shares = allocate(cap, &capacities, scale);
    deductions
        .into_iter()
        .zip(shares)
        .map(|(deduction, amount)| LineDeduction { amount, ..deduction })
        .collect()
}
