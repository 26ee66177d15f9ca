pub mod amount;
pub mod diagnostics;
pub mod eligibility;
pub mod money;
pub mod stacking;
pub mod targeting;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::cart::CartContext;
use crate::domain::discount::{Discount, DiscountId};
use crate::domain::usage::UsageSnapshot;
use crate::errors::DomainError;

use self::{
    amount::{AmountCalculator, AmountOutcome, DeterministicAmountCalculator},
    diagnostics::{Diagnostic, DiagnosticKind},
    eligibility::{DeterministicEligibilityFilter, EligibilityFilter},
    stacking::{
        DeterministicStackingResolver, DiscountProposal, LineItemAdjustment, StackingResolver,
    },
    targeting::LineTargeting,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub discount_id: DiscountId,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub currency: String,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total: Decimal,
    pub applied_discounts: Vec<AppliedDiscount>,
    pub adjustments: Vec<LineItemAdjustment>,
    pub diagnostics: Vec<Diagnostic>,
}

pub trait PricingPipeline: Send + Sync {
    fn evaluate(
        &self,
        cart: &CartContext,
        discounts: &[Discount],
        usage: &UsageSnapshot,
    ) -> Result<PricingResult, DomainError>;
}

pub struct DeterministicPricingPipeline<E, A, S> {
    eligibility: E,
    amounts: A,
    stacking: S,
    targeting: LineTargeting,
    currency: String,
}

impl<E, A, S> DeterministicPricingPipeline<E, A, S> {
    pub fn new(eligibility: E, amounts: A, stacking: S) -> Self {
        let defaults = AppConfig::default();
        Self {
            eligibility,
            amounts,
            stacking,
            targeting: LineTargeting::new(defaults.rules.numeric_coercion),
            currency: defaults.pricing.currency,
        }
    }

    pub fn with_targeting(mut self, targeting: LineTargeting) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

pub type DefaultPricingPipeline = DeterministicPricingPipeline<
    DeterministicEligibilityFilter,
    DeterministicAmountCalculator,
    DeterministicStackingResolver,
>;

impl Default for DefaultPricingPipeline {
    fn default() -> Self {
        Self::new(
            DeterministicEligibilityFilter,
            DeterministicAmountCalculator::default(),
            DeterministicStackingResolver::default(),
        )
    }
}

impl DefaultPricingPipeline {
    pub fn from_config(config: &AppConfig) -> Self {
        let scale = config.pricing.rounding_scale;
        Self::new(
            DeterministicEligibilityFilter,
            DeterministicAmountCalculator::new(scale),
            DeterministicStackingResolver::new(scale),
        )
        .with_targeting(LineTargeting::new(config.rules.numeric_coercion))
        .with_currency(config.pricing.currency.clone())
    }
}

impl<E, A, S> PricingPipeline for DeterministicPricingPipeline<E, A, S>
where
    E: EligibilityFilter,
    A: AmountCalculator,
    S: StackingResolver,
{
    fn evaluate(
        &self,
        cart: &CartContext,
        discounts: &[Discount],
        usage: &UsageSnapshot,
    ) -> Result<PricingResult, DomainError> {
        cart.validate()?;

        let eligibility = self.eligibility.filter(discounts, cart, usage, cart);
        let mut diagnostics = eligibility.diagnostics;
        let mut proposals = Vec::new();

        for discount in eligibility.eligible {
            let selection = self.targeting.select(discount, cart);
            diagnostics.extend(selection.diagnostics);
            if selection.lines.is_empty() {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::NoMatchingLines, "no line item is targeted")
                        .for_discount(&discount.id),
                );
                continue;
            }

            let amount = self.amounts.calculate(discount, &selection.lines);
            if amount.outcome == AmountOutcome::NotImplemented {
                let message = format!("{} is not evaluated yet; amount is zero", discount.kind);
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::NotImplemented, message)
                        .for_discount(&discount.id),
                );
                continue;
            }
            if amount.total > Decimal::ZERO {
                proposals.push(DiscountProposal { discount, amount });
            }
        }

        let stacked = self.stacking.resolve(cart, proposals);
        diagnostics.extend(stacked.diagnostics);

        let subtotal = cart.subtotal();
        let total_discount: Decimal = stacked.adjustments.iter().map(|entry| entry.amount).sum();
        let result = PricingResult {
            currency: self.currency.clone(),
            subtotal,
            total_discount,
            total: (subtotal - total_discount).max(Decimal::ZERO),
            applied_discounts: applied_discounts(&stacked.adjustments),
            adjustments: stacked.adjustments,
            diagnostics,
        };

        debug!(
            event_name = "pricing.cart.evaluated",
            line_items = cart.line_items.len(),
            discounts = discounts.len(),
            applied = result.applied_discounts.len(),
            subtotal = %result.subtotal,
            total_discount = %result.total_discount,
            "cart priced"
        );

        Ok(result)
    }
}

/// Per-discount totals in first-application order.
fn applied_discounts(adjustments: &[LineItemAdjustment]) -> Vec<AppliedDiscount> {
    let mut applied: Vec<AppliedDiscount> = Vec::new();
    for adjustment in adjustments {
        match applied.iter_mut().find(|entry| entry.discount_id == adjustment.discount_id) {
            Some(entry) => entry.amount += adjustment.amount,
            None => applied.push(AppliedDiscount {
                discount_id: adjustment.discount_id.clone(),
                amount: adjustment.amount,
            }),
        }
    }
    applied.retain(|entry| entry.amount > Decimal::ZERO);
    applied
}

/// Prices a cart with the default engines: strict numeric coercion, half-up
/// rounding to two decimal places.
pub fn evaluate_pricing(
    cart: &CartContext,
    discounts: &[Discount],
    usage: &UsageSnapshot,
) -> Result<PricingResult, DomainError> {
    DefaultPricingPipeline::default().evaluate(cart, discounts, usage)
}
