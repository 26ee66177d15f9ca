use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::cart::LineItemId;
use crate::domain::discount::{DiscountConfigError, DiscountId};
use crate::rules::Ambiguity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// The discount record cannot be evaluated for its type; it was skipped.
    Configuration,
    /// A rule could not be decided and counted as no match.
    EvaluationAmbiguity,
    /// A runtime constraint (dates, usage, customer, coupon, ...) excluded the discount.
    Ineligible,
    NoMatchingLines,
    StackingConflict,
    NotImplemented,
    InvariantViolation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibleReason {
    Inactive,
    NotStarted,
    Expired,
    BelowMinimumOrder,
    UsageLimitReached,
    CustomerLimitReached,
    CustomerNotTargeted,
    CouponMissing,
    CouponMismatch,
}

impl IneligibleReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "discount is not active",
            Self::NotStarted => "discount has not started yet",
            Self::Expired => "discount has ended",
            Self::BelowMinimumOrder => "cart subtotal is below the minimum order amount",
            Self::UsageLimitReached => "discount reached its total usage limit",
            Self::CustomerLimitReached => "customer reached the per-customer usage limit",
            Self::CustomerNotTargeted => "customer is not targeted by this discount",
            Self::CouponMissing => "coupon discount requires a coupon code",
            Self::CouponMismatch => "coupon code does not match",
        }
    }
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side-channel record for the admin preview. Diagnostics never change the
/// computed amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<DiscountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_item_id: Option<LineItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<IneligibleReason>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self { kind, discount_id: None, line_item_id: None, reason: None, message: message.into() }
    }

    pub fn for_discount(mut self, discount_id: &DiscountId) -> Self {
        self.discount_id = Some(discount_id.clone());
        self
    }

    pub fn for_line(mut self, line_item_id: &LineItemId) -> Self {
        self.line_item_id = Some(line_item_id.clone());
        self
    }

    pub fn configuration(error: &DiscountConfigError) -> Self {
        Self::new(DiagnosticKind::Configuration, error.to_string())
            .for_discount(error.discount_id())
    }

    pub fn ineligible(discount_id: &DiscountId, reason: IneligibleReason) -> Self {
        let mut diagnostic =
            Self::new(DiagnosticKind::Ineligible, reason.as_str()).for_discount(discount_id);
        diagnostic.reason = Some(reason);
        diagnostic
    }

    pub fn ambiguity(
        discount_id: &DiscountId,
        line_item_id: &LineItemId,
        ambiguity: &Ambiguity,
    ) -> Self {
        Self::new(
            DiagnosticKind::EvaluationAmbiguity,
            format!(
                "rule `{} {}` was not decided: {}",
                ambiguity.field, ambiguity.condition, ambiguity.reason
            ),
        )
        .for_discount(discount_id)
        .for_line(line_item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticKind, IneligibleReason};
    use crate::domain::discount::DiscountId;

    #[test]
    fn ineligible_diagnostic_serializes_reason_tag() {
        let diagnostic =
            Diagnostic::ineligible(&DiscountId("d-1".to_string()), IneligibleReason::Expired);

        let json = serde_json::to_value(&diagnostic).expect("diagnostic serializes");
        assert_eq!(json["kind"], "INELIGIBLE");
        assert_eq!(json["reason"], "EXPIRED");
        assert_eq!(json["discountId"], "d-1");
        assert!(json.get("lineItemId").is_none());
        assert_eq!(diagnostic.kind, DiagnosticKind::Ineligible);
    }
}
