use tracing::debug;

use crate::domain::cart::{CartContext, LineItem};
use crate::domain::discount::{Discount, DiscountTarget};
use crate::promotions::diagnostics::Diagnostic;
use crate::rules::{line_item_schema, NumericCoercion, RuleSetEvaluator};

#[derive(Clone, Debug, Default)]
pub struct TargetSelection<'a> {
    /// Targeted lines in cart order.
    pub lines: Vec<&'a LineItem>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Narrows a cart to the lines a discount applies to: the `target` enum with
/// its id lists first, then the optional `productRules` over the line item
/// schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineTargeting {
    evaluator: RuleSetEvaluator,
}

impl LineTargeting {
    pub fn new(coercion: NumericCoercion) -> Self {
        Self { evaluator: RuleSetEvaluator::new(coercion) }
    }

    pub fn select<'a>(&self, discount: &Discount, cart: &'a CartContext) -> TargetSelection<'a> {
        let mut selection = TargetSelection::default();

        for line in cart.line_items.iter().filter(|line| targets_line(discount, line)) {
            let Some(rule_set) = &discount.product_rules else {
                selection.lines.push(line);
                continue;
            };

            let mut ambiguities = Vec::new();
            let record = line_item_schema().bind(line);
            if self.evaluator.matches_traced(rule_set, &record, &mut ambiguities) {
                selection.lines.push(line);
            }
            for ambiguity in &ambiguities {
                debug!(
                    event_name = "pricing.rule.ambiguous",
                    discount_id = %discount.id,
                    line_item_id = %line.id,
                    field = %ambiguity.field,
                    reason = %ambiguity.reason,
                    "product rule could not be decided; treated as no match"
                );
                let diagnostic = Diagnostic::ambiguity(&discount.id, &line.id, ambiguity);
                selection.diagnostics.push(diagnostic);
            }
        }

        selection
    }
}

pub fn targets_line(discount: &Discount, line: &LineItem) -> bool {
    match discount.target {
        DiscountTarget::AllProducts => true,
        DiscountTarget::SpecificProducts => discount.product_ids.contains(&line.product_id),
        DiscountTarget::SpecificCategories => line.in_any_category(&discount.category_ids),
        DiscountTarget::ExcludeProducts => !discount.product_ids.contains(&line.product_id),
        DiscountTarget::ExcludeCategories => !line.in_any_category(&discount.category_ids),
    }
}
