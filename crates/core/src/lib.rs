pub mod config;
pub mod domain;
pub mod errors;
pub mod membership;
pub mod promotions;
pub mod rules;

pub use domain::cart::{CartContext, LineItem, LineItemId};
pub use domain::customer::{CustomerId, CustomerRef};
pub use domain::discount::{
    CustomerTarget, Discount, DiscountConfigError, DiscountId, DiscountTarget, DiscountType,
    VolumeTier,
};
pub use domain::product::{CategoryId, Product, ProductId};
pub use domain::rule::{Condition, MatchType, Rule, RuleSet};
pub use domain::usage::UsageSnapshot;
pub use errors::{ApplicationError, DomainError};
pub use membership::{
    delta, AutomaticGroup, GroupId, GroupKind, MembershipDelta, MembershipRecomputer,
    MembershipReport,
};
pub use promotions::diagnostics::{Diagnostic, DiagnosticKind, IneligibleReason};
pub use promotions::eligibility::{ClockSource, FixedClock};
pub use promotions::stacking::LineItemAdjustment;
pub use promotions::{
    evaluate_pricing, AppliedDiscount, DefaultPricingPipeline, DeterministicPricingPipeline,
    PricingPipeline, PricingResult,
};
pub use rules::{evaluate, matches_rule_set, FieldSource, FieldValue, NumericCoercion};
