use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::cart::{CartContext, LineItemId};
use crate::domain::discount::{Discount, DiscountId};
use crate::promotions::amount::DiscountAmount;
use crate::promotions::diagnostics::{Diagnostic, DiagnosticKind};
use crate::promotions::money::{round_money, scale_by, DEFAULT_ROUNDING_SCALE};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemAdjustment {
    pub line_item_id: LineItemId,
    pub discount_id: DiscountId,
    pub amount: Decimal,
}

/// A discount that survived eligibility and targeting, with its standalone
/// amount computed against the full line prices.
#[derive(Clone, Debug)]
pub struct DiscountProposal<'a> {
    pub discount: &'a Discount,
    pub amount: DiscountAmount,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackingOutcome {
    /// Adjustments in application order.
    pub adjustments: Vec<LineItemAdjustment>,
    pub diagnostics: Vec<Diagnostic>,
}

pub trait StackingResolver: Send + Sync {
    fn resolve(&self, cart: &CartContext, proposals: Vec<DiscountProposal<'_>>) -> StackingOutcome;
}

#[derive(Clone, Copy, Debug)]
pub struct DeterministicStackingResolver {
    rounding_scale: u32,
}

impl Default for DeterministicStackingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDING_SCALE)
    }
}

impl DeterministicStackingResolver {
    pub fn new(rounding_scale: u32) -> Self {
        Self { rounding_scale }
    }
}

#[derive(Clone, Copy, Debug)]
struct LineState {
    original: Decimal,
    remaining: Decimal,
    touched: bool,
    /// Every discount applied so far allows combining.
    combinable: bool,
}

impl LineState {
    fn accepts(&self, discount: &Discount) -> bool {
        !self.touched || (self.combinable && discount.can_combine)
    }
}

impl StackingResolver for DeterministicStackingResolver {
    fn resolve(
        &self,
        cart: &CartContext,
        mut proposals: Vec<DiscountProposal<'_>>,
    ) -> StackingOutcome {
        proposals.sort_by(|left, right| {
            right
                .discount
                .priority
                .cmp(&left.discount.priority)
                .then_with(|| left.discount.id.cmp(&right.discount.id))
        });

        let mut lines: BTreeMap<&LineItemId, LineState> = cart
            .line_items
            .iter()
            .map(|line| {
                let total = line.line_total();
                let state = LineState {
                    original: total,
                    remaining: total,
                    touched: false,
                    combinable: true,
                };
                (&line.id, state)
            })
            .collect();
        let mut outcome = StackingOutcome::default();

        for proposal in &proposals {
            let discount = proposal.discount;
            for deduction in &proposal.amount.deductions {
                let Some(state) = lines.get_mut(&deduction.line_item_id) else {
                    continue;
                };
                if deduction.amount <= Decimal::ZERO {
                    continue;
                }

                if !state.accepts(discount) {
                    debug!(
                        event_name = "pricing.stacking.conflict",
                        discount_id = %discount.id,
                        line_item_id = %deduction.line_item_id,
                        "line already carries a discount that does not combine"
                    );
                    outcome.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::StackingConflict,
                            "skipped: line already discounted and the discounts do not combine",
                        )
                        .for_discount(&discount.id)
                        .for_line(&deduction.line_item_id),
                    );
                    continue;
                }

                let amount = self.rebase(discount, deduction.amount, state).min(state.remaining);
                if amount <= Decimal::ZERO {
                    continue;
                }

                state.remaining -= amount;
                state.touched = true;
                state.combinable &= discount.can_combine;
                outcome.adjustments.push(LineItemAdjustment {
                    line_item_id: deduction.line_item_id.clone(),
                    discount_id: discount.id.clone(),
                    amount,
                });
            }
        }

        clamp_overdrawn_lines(&lines, &mut outcome);
        outcome
    }
}

impl DeterministicStackingResolver {
    /// Price-proportional amounts shrink with the line once earlier discounts
    /// have reduced it; flat amounts are only clamped by the caller.
    fn rebase(&self, discount: &Discount, amount: Decimal, state: &LineState) -> Decimal {
        if !discount.kind.scales_with_price()
            || state.remaining >= state.original
            || state.original.is_zero()
        {
            return amount;
        }
        round_money(scale_by(amount, state.remaining, state.original), self.rounding_scale)
    }
}

/// Final guard: no line may be discounted beyond its original total. Excess is
/// removed from the most recently applied adjustments.
fn clamp_overdrawn_lines(
    lines: &BTreeMap<&LineItemId, LineState>,
    outcome: &mut StackingOutcome,
) {
    for (line_item_id, state) in lines {
        let applied: Decimal = outcome
            .adjustments
            .iter()
            .filter(|adjustment| &adjustment.line_item_id == *line_item_id)
            .map(|adjustment| adjustment.amount)
            .sum();
        let mut excess = applied - state.original;
        if excess <= Decimal::ZERO {
            continue;
        }

        error!(
            event_name = "pricing.invariant.clamped",
            line_item_id = %line_item_id,
            applied = %applied,
            original = %state.original,
            "line adjustments exceeded the line total; clamping"
        );
        outcome.diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::InvariantViolation,
                format!("adjustments {applied} exceeded line total {}; clamped", state.original),
            )
            .for_line(line_item_id),
        );

        for adjustment in outcome.adjustments.iter_mut().rev() {
            if excess <= Decimal::ZERO {
                break;
            }
            if &adjustment.line_item_id != *line_item_id {
                continue;
            }
            let cut = excess.min(adjustment.amount);
            adjustment.amount -= cut;
            excess -= cut;
        }
    }
    outcome.adjustments.retain(|adjustment| adjustment.amount > Decimal::ZERO);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{
        clamp_overdrawn_lines, DeterministicStackingResolver, DiscountProposal, LineItemAdjustment,
        LineState, StackingOutcome, StackingResolver,
    };
    use crate::domain::cart::{CartContext, LineItem, LineItemId};
    use crate::domain::discount::{Discount, DiscountId, DiscountType};
    use crate::domain::product::ProductId;
    use crate::promotions::amount::{AmountOutcome, DiscountAmount, LineDeduction};
    use crate::promotions::diagnostics::DiagnosticKind;

    fn cart() -> CartContext {
        let line = |id: &str, price: i64| LineItem {
            id: LineItemId(id.to_string()),
            product_id: ProductId(format!("p-{id}")),
            category_ids: Vec::new(),
            price: Decimal::from(price),
            quantity: 1,
            tags: Vec::new(),
            sku: None,
            title: None,
        };
        CartContext {
            line_items: vec![line("l-1", 100), line("l-2", 50)],
            customer: None,
            coupon_code: None,
            now: Utc::now(),
        }
    }

    fn discount(id: &str, kind: DiscountType, priority: i32, can_combine: bool) -> Discount {
        let mut discount = Discount::new(id, kind, Decimal::ZERO);
        discount.priority = priority;
        discount.can_combine = can_combine;
        discount
    }

    fn proposal<'a>(discount: &'a Discount, deductions: &[(&str, i64)]) -> DiscountProposal<'a> {
        let deductions: Vec<LineDeduction> = deductions
            .iter()
            .map(|(line, amount)| LineDeduction {
                line_item_id: LineItemId(line.to_string()),
                amount: Decimal::from(*amount),
            })
            .collect();
        let total = deductions.iter().map(|deduction| deduction.amount).sum();
        DiscountProposal {
            discount,
            amount: DiscountAmount {
                discount_id: discount.id.clone(),
                deductions,
                total,
                outcome: AmountOutcome::Computed,
            },
        }
    }

    fn applied(outcome: &StackingOutcome, discount_id: &str, line_item_id: &str) -> Decimal {
        outcome
            .adjustments
            .iter()
            .filter(|adjustment| {
                adjustment.discount_id.0 == discount_id && adjustment.line_item_id.0 == line_item_id
            })
            .map(|adjustment| adjustment.amount)
            .sum()
    }

    #[test]
    fn higher_priority_non_combinable_discount_wins_the_line() {
        let high = discount("d-high", DiscountType::Percentage, 10, false);
        let low = discount("d-low", DiscountType::Percentage, 5, false);
        let cart = cart();

        let outcome = DeterministicStackingResolver::default().resolve(
            &cart,
            vec![proposal(&low, &[("l-1", 20)]), proposal(&high, &[("l-1", 10)])],
        );

        assert_eq!(applied(&outcome, "d-high", "l-1"), Decimal::from(10));
        assert_eq!(applied(&outcome, "d-low", "l-1"), Decimal::ZERO);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::StackingConflict);
        assert_eq!(outcome.diagnostics[0].discount_id, Some(DiscountId("d-low".to_string())));
    }

    #[test]
    fn conflict_on_one_line_leaves_other_lines_applied() {
        let high = discount("d-high", DiscountType::Fixed, 10, false);
        let low = discount("d-low", DiscountType::Fixed, 5, true);
        let cart = cart();

        let outcome = DeterministicStackingResolver::default().resolve(
            &cart,
            vec![proposal(&high, &[("l-1", 10)]), proposal(&low, &[("l-1", 5), ("l-2", 5)])],
        );

        assert_eq!(applied(&outcome, "d-low", "l-1"), Decimal::ZERO);
        assert_eq!(applied(&outcome, "d-low", "l-2"), Decimal::from(5));
    }

    #[test]
    fn combinable_percentages_rebase_on_remaining_price() {
        let first = discount("d-a", DiscountType::Percentage, 1, true);
        let second = discount("d-b", DiscountType::Percentage, 1, true);
        let cart = cart();

        // 20% then 10% of 100: the second applies to the remaining 80.
        let outcome = DeterministicStackingResolver::default().resolve(
            &cart,
            vec![proposal(&second, &[("l-1", 10)]), proposal(&first, &[("l-1", 20)])],
        );

        assert_eq!(applied(&outcome, "d-a", "l-1"), Decimal::from(20));
        assert_eq!(applied(&outcome, "d-b", "l-1"), Decimal::from(8));
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn fixed_amounts_are_clamped_to_remaining_price() {
        let first = discount("d-a", DiscountType::Fixed, 2, true);
        let second = discount("d-b", DiscountType::Fixed, 1, true);
        let cart = cart();

        let outcome = DeterministicStackingResolver::default().resolve(
            &cart,
            vec![proposal(&first, &[("l-2", 40)]), proposal(&second, &[("l-2", 40)])],
        );

        assert_eq!(applied(&outcome, "d-a", "l-2"), Decimal::from(40));
        assert_eq!(applied(&outcome, "d-b", "l-2"), Decimal::from(10));
    }

    #[test]
    fn combinable_discount_cannot_join_an_exclusive_one() {
        let exclusive = discount("d-exclusive", DiscountType::Percentage, 9, false);
        let stackable = discount("d-stackable", DiscountType::Percentage, 1, true);
        let cart = cart();

        let outcome = DeterministicStackingResolver::default().resolve(
            &cart,
            vec![proposal(&stackable, &[("l-1", 5)]), proposal(&exclusive, &[("l-1", 30)])],
        );

        assert_eq!(applied(&outcome, "d-stackable", "l-1"), Decimal::ZERO);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::StackingConflict);
    }

    #[test]
    fn equal_priority_breaks_ties_by_id() {
        let b = discount("d-b", DiscountType::Fixed, 3, false);
        let a = discount("d-a", DiscountType::Fixed, 3, false);
        let cart = cart();

        let outcome = DeterministicStackingResolver::default().resolve(
            &cart,
            vec![proposal(&b, &[("l-1", 7)]), proposal(&a, &[("l-1", 9)])],
        );

        assert_eq!(applied(&outcome, "d-a", "l-1"), Decimal::from(9));
        assert_eq!(applied(&outcome, "d-b", "l-1"), Decimal::ZERO);
    }

    #[test]
    fn overdrawn_line_is_clamped_with_diagnostic() {
        let line_id = LineItemId("l-1".to_string());
        let lines = [(
            &line_id,
            LineState {
                original: Decimal::from(10),
                remaining: Decimal::ZERO,
                touched: true,
                combinable: true,
            },
        )]
        .into_iter()
        .collect();
        let mut outcome = StackingOutcome {
            adjustments: vec![
                LineItemAdjustment {
                    line_item_id: line_id.clone(),
                    discount_id: DiscountId("d-a".to_string()),
                    amount: Decimal::from(8),
                },
                LineItemAdjustment {
                    line_item_id: line_id.clone(),
                    discount_id: DiscountId("d-b".to_string()),
                    amount: Decimal::from(5),
                },
            ],
            diagnostics: Vec::new(),
        };

        clamp_overdrawn_lines(&lines, &mut outcome);

        assert_eq!(outcome.adjustments[0].amount, Decimal::from(8));
        assert_eq!(outcome.adjustments[1].amount, Decimal::from(2));
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::InvariantViolation);
    }
}
