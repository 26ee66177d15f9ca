//! Automatic category and collection membership.
//!
//! A group's rule set is evaluated against every product through the product
//! field schema, with the same evaluator discount targeting uses.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::product::{Product, ProductId};
use crate::domain::rule::RuleSet;
use crate::rules::{product_schema, Ambiguity, NumericCoercion, RuleSetError, RuleSetEvaluator};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupKind {
    Category,
    Collection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticGroup {
    pub id: GroupId,
    pub kind: GroupKind,
    #[serde(default)]
    pub title: String,
    pub rule_set: RuleSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub kind: GroupKind,
    /// Matching products in catalog order.
    pub members: Vec<ProductId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguities: Vec<MemberAmbiguity>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAmbiguity {
    pub product_id: ProductId,
    pub ambiguity: Ambiguity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFailure {
    pub group_id: GroupId,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipReport {
    pub groups: Vec<GroupMembership>,
    pub failures: Vec<GroupFailure>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDelta {
    pub added: Vec<ProductId>,
    pub removed: Vec<ProductId>,
}

impl MembershipDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MembershipRecomputer {
    evaluator: RuleSetEvaluator,
}

impl MembershipRecomputer {
    pub fn new(coercion: NumericCoercion) -> Self {
        Self { evaluator: RuleSetEvaluator::new(coercion) }
    }

    pub fn members(
        &self,
        group: &AutomaticGroup,
        products: &[Product],
    ) -> Result<Vec<ProductId>, RuleSetError> {
        self.evaluate_group(group, products).map(|membership| membership.members)
    }

    /// Every group with a valid rule set gets a membership entry; invalid ones
    /// are reported as failures and do not stop the others.
    pub fn recompute(&self, groups: &[AutomaticGroup], products: &[Product]) -> MembershipReport {
        let mut report = MembershipReport::default();

        for group in groups {
            match self.evaluate_group(group, products) {
                Ok(membership) => {
                    debug!(
                        event_name = "membership.group.recomputed",
                        group_id = %group.id,
                        members = membership.members.len(),
                        "automatic group recomputed"
                    );
                    report.groups.push(membership);
                }
                Err(error) => {
                    warn!(
                        event_name = "membership.group.invalid",
                        group_id = %group.id,
                        error = %error,
                        "automatic group skipped: rule set is invalid"
                    );
                    report.failures.push(GroupFailure {
                        group_id: group.id.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        report
    }

    fn evaluate_group(
        &self,
        group: &AutomaticGroup,
        products: &[Product],
    ) -> Result<GroupMembership, RuleSetError> {
        let schema = product_schema();
        schema.validate(&group.rule_set)?;

        let mut membership = GroupMembership {
            group_id: group.id.clone(),
            kind: group.kind,
            members: Vec::new(),
            ambiguities: Vec::new(),
        };
        for product in products {
            let mut ambiguities = Vec::new();
            let record = schema.bind(product);
            if self.evaluator.matches_traced(&group.rule_set, &record, &mut ambiguities) {
                membership.members.push(product.id.clone());
            }
            membership.ambiguities.extend(ambiguities.into_iter().map(|ambiguity| {
                MemberAmbiguity { product_id: product.id.clone(), ambiguity }
            }));
        }

        Ok(membership)
    }
}

/// Ids to add to and remove from a stored member list so it equals
/// `recomputed`. Both sides keep the order they had in their source list.
pub fn delta(current: &[ProductId], recomputed: &[ProductId]) -> MembershipDelta {
    let current_set: BTreeSet<&ProductId> = current.iter().collect();
    let recomputed_set: BTreeSet<&ProductId> = recomputed.iter().collect();

    MembershipDelta {
        added: recomputed.iter().filter(|id| !current_set.contains(id)).cloned().collect(),
        removed: current.iter().filter(|id| !recomputed_set.contains(id)).cloned().collect(),
    }
}
