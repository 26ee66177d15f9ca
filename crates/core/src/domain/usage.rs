use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::domain::discount::DiscountId;

/// Redemption counts read at the moment of pricing. The engine never writes
/// these; order placement increments them transactionally elsewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    #[serde(default)]
    pub total_uses: BTreeMap<DiscountId, u32>,
    #[serde(default)]
    pub customer_uses: BTreeMap<CustomerId, BTreeMap<DiscountId, u32>>,
}

impl UsageSnapshot {
    pub fn total_uses(&self, discount_id: &DiscountId) -> Option<u32> {
        self.total_uses.get(discount_id).copied()
    }

    pub fn customer_uses(&self, customer_id: &CustomerId, discount_id: &DiscountId) -> Option<u32> {
        self.customer_uses.get(customer_id).and_then(|uses| uses.get(discount_id)).copied()
    }

    pub fn record_total(mut self, discount_id: &str, uses: u32) -> Self {
        self.total_uses.insert(DiscountId(discount_id.to_string()), uses);
        self
    }

    pub fn record_customer(mut self, customer_id: &str, discount_id: &str, uses: u32) -> Self {
        self.customer_uses
            .entry(CustomerId(customer_id.to_string()))
            .or_default()
            .insert(DiscountId(discount_id.to_string()), uses);
        self
    }
}
