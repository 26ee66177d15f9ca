use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::cart::CartContext;
use crate::domain::discount::{CustomerTarget, Discount};
use crate::domain::usage::UsageSnapshot;
use crate::promotions::diagnostics::{Diagnostic, IneligibleReason};

/// Source of "now" for date-window checks.
pub trait ClockSource {
    fn now(&self) -> DateTime<Utc>;
}

impl ClockSource for CartContext {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl ClockSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct EligibilityOutcome<'a> {
    /// Eligible discounts in their input order.
    pub eligible: Vec<&'a Discount>,
    pub diagnostics: Vec<Diagnostic>,
}

pub trait EligibilityFilter: Send + Sync {
    fn filter<'a>(
        &self,
        discounts: &'a [Discount],
        cart: &CartContext,
        usage: &UsageSnapshot,
        clock: &dyn ClockSource,
    ) -> EligibilityOutcome<'a>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicEligibilityFilter;

impl EligibilityFilter for DeterministicEligibilityFilter {
    fn filter<'a>(
        &self,
        discounts: &'a [Discount],
        cart: &CartContext,
        usage: &UsageSnapshot,
        clock: &dyn ClockSource,
    ) -> EligibilityOutcome<'a> {
        let now = clock.now();
        let mut outcome = EligibilityOutcome::default();

        for discount in discounts {
            if let Err(error) = discount.validate() {
                warn!(
                    event_name = "pricing.discount.invalid",
                    discount_id = %discount.id,
                    error = %error,
                    "discount skipped: configuration error"
                );
                outcome.diagnostics.push(Diagnostic::configuration(&error));
                continue;
            }

            match check_eligibility(discount, cart, usage, now) {
                Ok(()) => outcome.eligible.push(discount),
                Err(reason) => {
                    debug!(
                        event_name = "pricing.discount.skipped",
                        discount_id = %discount.id,
                        reason = %reason,
                        "discount is not eligible for this cart"
                    );
                    outcome.diagnostics.push(Diagnostic::ineligible(&discount.id, reason));
                }
            }
        }

        outcome
    }
}

/// Runtime constraints of a structurally valid discount, checked in a fixed
/// order; the first failing check is reported.
pub fn check_eligibility(
    discount: &Discount,
    cart: &CartContext,
    usage: &UsageSnapshot,
    now: DateTime<Utc>,
) -> Result<(), IneligibleReason> {
    if !discount.is_active {
        return Err(IneligibleReason::Inactive);
    }

    if discount.start_date.is_some_and(|start| now < start) {
        return Err(IneligibleReason::NotStarted);
    }
    if discount.end_date.is_some_and(|end| now > end) {
        return Err(IneligibleReason::Expired);
    }

    if discount.min_order_amount.is_some_and(|minimum| cart.subtotal() < minimum) {
        return Err(IneligibleReason::BelowMinimumOrder);
    }

    // Missing counters mean the discount was never redeemed.
    if let (Some(max_uses), Some(used)) = (discount.max_uses, usage.total_uses(&discount.id)) {
        if used >= max_uses {
            return Err(IneligibleReason::UsageLimitReached);
        }
    }
    if discount.uses_per_customer > 0 {
        let used = cart
            .customer
            .as_ref()
            .and_then(|customer| usage.customer_uses(&customer.id, &discount.id));
        if used.is_some_and(|used| used >= discount.uses_per_customer) {
            return Err(IneligibleReason::CustomerLimitReached);
        }
    }

    let targeted = match discount.customer_target {
        CustomerTarget::AllCustomers => true,
        CustomerTarget::RegisteredCustomers => cart.customer.is_some(),
        CustomerTarget::CustomerTiers => cart
            .customer
            .as_ref()
            .is_some_and(|customer| customer.in_tier(&discount.customer_tiers)),
    };
    if !targeted {
        return Err(IneligibleReason::CustomerNotTargeted);
    }

    if !discount.is_automatic {
        let entered = cart.coupon_code.as_deref().map(str::trim).filter(|code| !code.is_empty());
        let Some(entered) = entered else {
            return Err(IneligibleReason::CouponMissing);
        };
        let expected = discount.code.as_deref().map(str::trim).unwrap_or_default();
        if !entered.eq_ignore_ascii_case(expected) {
            return Err(IneligibleReason::CouponMismatch);
        }
    }

    Ok(())
}
