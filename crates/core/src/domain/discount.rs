use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{CategoryId, ProductId};
use crate::domain::rule::RuleSet;
use crate::rules::schema::{line_item_schema, RuleSetError};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountId(pub String);

impl fmt::Display for DiscountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
    BuyXGetY,
    VolumeDiscount,
    NthItemDiscount,
}

impl DiscountType {
    /// Whether the deduction is a share of the line price (and so shrinks with
    /// it when an earlier discount already reduced the line) rather than a flat
    /// currency amount.
    pub fn scales_with_price(self) -> bool {
        !matches!(self, Self::Fixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::Fixed => "FIXED",
            Self::BuyXGetY => "BUY_X_GET_Y",
            Self::VolumeDiscount => "VOLUME_DISCOUNT",
            Self::NthItemDiscount => "NTH_ITEM_DISCOUNT",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountTarget {
    #[default]
    AllProducts,
    SpecificProducts,
    SpecificCategories,
    ExcludeProducts,
    ExcludeCategories,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerTarget {
    #[default]
    AllCustomers,
    RegisteredCustomers,
    CustomerTiers,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeTier {
    pub min_qty: u32,
    pub discount_percent: Decimal,
}

/// A stored promotion. Read-only while pricing; usage counters live in
/// [`crate::domain::usage::UsageSnapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: DiscountId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub kind: DiscountType,
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
    pub buy_quantity: Option<u32>,
    #[serde(default)]
    pub get_quantity: Option<u32>,
    #[serde(default)]
    pub get_discount_percent: Option<Decimal>,
    #[serde(default)]
    pub nth_item: Option<u32>,
    #[serde(default)]
    pub volume_tiers: Vec<VolumeTier>,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// Zero means no per-customer limit.
    #[serde(default)]
    pub uses_per_customer: u32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_automatic: bool,
    #[serde(default)]
    pub can_combine: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub target: DiscountTarget,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    #[serde(default)]
    pub customer_target: CustomerTarget,
    #[serde(default)]
    pub customer_tiers: Vec<String>,
    #[serde(default)]
    pub product_rules: Option<RuleSet>,
}

fn default_true() -> bool {
    true
}

/// A discount record that cannot be evaluated for its declared type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DiscountConfigError {
    #[error("discount `{discount_id}`: {discount_type} requires `{parameter}`")]
    MissingParameter {
        discount_id: DiscountId,
        discount_type: DiscountType,
        parameter: &'static str,
    },
    #[error("discount `{discount_id}`: `{parameter}` {reason}")]
    InvalidParameter { discount_id: DiscountId, parameter: &'static str, reason: String },
    #[error("discount `{discount_id}`: coupon discounts need a code")]
    MissingCouponCode { discount_id: DiscountId },
    #[error("discount `{discount_id}`: start date {start} is after end date {end}")]
    InvertedDateWindow { discount_id: DiscountId, start: DateTime<Utc>, end: DateTime<Utc> },
    #[error("discount `{discount_id}`: product rules are invalid: {source}")]
    ProductRules {
        discount_id: DiscountId,
        #[source]
        source: RuleSetError,
    },
}

impl DiscountConfigError {
    pub fn discount_id(&self) -> &DiscountId {
        match self {
            Self::MissingParameter { discount_id, .. }
            | Self::InvalidParameter { discount_id, .. }
            | Self::MissingCouponCode { discount_id }
            | Self::InvertedDateWindow { discount_id, .. }
            | Self::ProductRules { discount_id, .. } => discount_id,
        }
    }
}

impl Discount {
    /// An active, automatic, non-combinable discount on every product for every
    /// customer. Callers adjust the remaining fields.
    pub fn new(id: impl Into<String>, kind: DiscountType, value: Decimal) -> Self {
        Self {
            id: DiscountId(id.into()),
            title: String::new(),
            code: None,
            kind,
            value,
            buy_quantity: None,
            get_quantity: None,
            get_discount_percent: None,
            nth_item: None,
            volume_tiers: Vec::new(),
            min_order_amount: None,
            max_discount: None,
            max_uses: None,
            uses_per_customer: 0,
            start_date: None,
            end_date: None,
            is_active: true,
            is_automatic: true,
            can_combine: false,
            priority: 0,
            target: DiscountTarget::AllProducts,
            product_ids: Vec::new(),
            category_ids: Vec::new(),
            customer_target: CustomerTarget::AllCustomers,
            customer_tiers: Vec::new(),
            product_rules: None,
        }
    }

    pub fn validate(&self) -> Result<(), DiscountConfigError> {
        self.validate_amounts()?;
        self.validate_type_parameters()?;

        if !self.is_automatic
            && self.code.as_deref().map(str::trim).map(str::is_empty).unwrap_or(true)
        {
            return Err(DiscountConfigError::MissingCouponCode { discount_id: self.id.clone() });
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(DiscountConfigError::InvertedDateWindow {
                    discount_id: self.id.clone(),
                    start,
                    end,
                });
            }
        }

        if let Some(rules) = &self.product_rules {
            line_item_schema().validate(rules).map_err(|source| {
                DiscountConfigError::ProductRules { discount_id: self.id.clone(), source }
            })?;
        }

        Ok(())
    }

    fn validate_amounts(&self) -> Result<(), DiscountConfigError> {
        if self.value < Decimal::ZERO {
            return Err(self.invalid("value", "must not be negative"));
        }
        if matches!(self.kind, DiscountType::Percentage | DiscountType::NthItemDiscount)
            && self.value > Decimal::ONE_HUNDRED
        {
            return Err(self.invalid("value", "must be a percentage between 0 and 100"));
        }
        if self.min_order_amount.is_some_and(|amount| amount < Decimal::ZERO) {
            return Err(self.invalid("minOrderAmount", "must not be negative"));
        }
        if self.max_discount.is_some_and(|amount| amount < Decimal::ZERO) {
            return Err(self.invalid("maxDiscount", "must not be negative"));
        }
        Ok(())
    }

    fn validate_type_parameters(&self) -> Result<(), DiscountConfigError> {
        match self.kind {
            DiscountType::Percentage | DiscountType::Fixed => Ok(()),
            DiscountType::BuyXGetY => {
                self.positive("buyQuantity", self.buy_quantity)?;
                self.positive("getQuantity", self.get_quantity)?;
                let percent = self
                    .get_discount_percent
                    .ok_or_else(|| self.missing("getDiscountPercent"))?;
                if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                    return Err(self.invalid("getDiscountPercent", "must be between 0 and 100"));
                }
                Ok(())
            }
            DiscountType::NthItemDiscount => self.positive("nthItem", self.nth_item),
            DiscountType::VolumeDiscount => {
                if self.volume_tiers.is_empty() {
                    return Err(self.missing("volumeTiers"));
                }
                let mut previous_min = 0;
                for tier in &self.volume_tiers {
                    if tier.min_qty == 0 {
                        return Err(self.invalid("volumeTiers", "minQty must be at least 1"));
                    }
                    if tier.min_qty <= previous_min {
                        return Err(self.invalid("volumeTiers", "minQty must strictly increase"));
                    }
                    if tier.discount_percent < Decimal::ZERO
                        || tier.discount_percent > Decimal::ONE_HUNDRED
                    {
                        return Err(
                            self.invalid("volumeTiers", "discountPercent must be between 0 and 100")
                        );
                    }
                    previous_min = tier.min_qty;
                }
                Ok(())
            }
        }
    }

    fn positive(
        &self,
        parameter: &'static str,
        value: Option<u32>,
    ) -> Result<(), DiscountConfigError> {
        match value {
            None => Err(self.missing(parameter)),
            Some(0) => Err(self.invalid(parameter, "must be at least 1")),
            Some(_) => Ok(()),
        }
    }

    fn missing(&self, parameter: &'static str) -> DiscountConfigError {
        DiscountConfigError::MissingParameter {
            discount_id: self.id.clone(),
            discount_type: self.kind,
            parameter,
        }
    }

    fn invalid(&self, parameter: &'static str, reason: &str) -> DiscountConfigError {
        DiscountConfigError::InvalidParameter {
            discount_id: self.id.clone(),
            parameter,
            reason: reason.to_string(),
        }
    }
}
