use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerRef;
use crate::domain::product::{CategoryId, ProductId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub String);

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    /// Unit price.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn in_any_category(&self, categories: &[CategoryId]) -> bool {
        self.category_ids.iter().any(|category| categories.contains(category))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartContext {
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub now: DateTime<Utc>,
}

impl CartContext {
    pub fn subtotal(&self) -> Decimal {
        self.line_items.iter().map(LineItem::line_total).sum()
    }

    /// Rejects carts that break the line item invariants: non-negative unit
    /// price, quantity of at least one, and unique line ids. Line totals must
    /// also leave room for percentage arithmetic, and the subtotal must fit a
    /// `Decimal`.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        let mut subtotal = Decimal::ZERO;
        for line in &self.line_items {
            if line.id.0.trim().is_empty() {
                return Err(DomainError::InvalidLineItem {
                    line_item_id: line.id.clone(),
                    reason: "line item id is empty".to_string(),
                });
            }
            if !seen.insert(&line.id) {
                return Err(DomainError::DuplicateLineItem(line.id.clone()));
            }
            if line.price < Decimal::ZERO {
                return Err(DomainError::InvalidLineItem {
                    line_item_id: line.id.clone(),
                    reason: format!("unit price {} is negative", line.price),
                });
            }
            if line.quantity == 0 {
                return Err(DomainError::InvalidLineItem {
                    line_item_id: line.id.clone(),
                    reason: "quantity must be at least 1".to_string(),
                });
            }

            let line_total = line
                .price
                .checked_mul(Decimal::from(line.quantity))
                .filter(|total| total.checked_mul(Decimal::ONE_HUNDRED).is_some())
                .ok_or_else(|| DomainError::InvalidLineItem {
                    line_item_id: line.id.clone(),
                    reason: "line total overflows".to_string(),
                })?;
            subtotal = subtotal.checked_add(line_total).ok_or_else(|| {
                DomainError::InvariantViolation("cart subtotal overflows".to_string())
            })?;
        }
        Ok(())
    }
}
