use crate::domain::rule::{MatchType, RuleSet};
use crate::rules::field::FieldSource;
use crate::rules::predicate::{evaluate_rule, Ambiguity, NumericCoercion, Verdict};

/// Folds rule verdicts with the rule set's match type. Shared by discount
/// targeting and automatic category/collection membership, so both sides see
/// the same answer for the same record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuleSetEvaluator {
    coercion: NumericCoercion,
}

impl RuleSetEvaluator {
    pub fn new(coercion: NumericCoercion) -> Self {
        Self { coercion }
    }

    pub fn matches<S: FieldSource + ?Sized>(&self, rule_set: &RuleSet, record: &S) -> bool {
        let mut ignored = Vec::new();
        self.matches_traced(rule_set, record, &mut ignored)
    }

    /// Like [`Self::matches`], also collecting ambiguities for the rules that
    /// were actually evaluated before the result was decided.
    pub fn matches_traced<S: FieldSource + ?Sized>(
        &self,
        rule_set: &RuleSet,
        record: &S,
        ambiguities: &mut Vec<Ambiguity>,
    ) -> bool {
        let mut verdicts =
            rule_set.rules.iter().map(|rule| evaluate_rule(rule, record, self.coercion));
        let mut decide = |verdict: Verdict| match verdict {
            Verdict::Match => true,
            Verdict::NoMatch => false,
            Verdict::Ambiguous(ambiguity) => {
                ambiguities.push(ambiguity);
                false
            }
        };

        match rule_set.match_type {
            MatchType::All => verdicts.all(&mut decide),
            MatchType::Any => verdicts.any(&mut decide),
        }
    }
}

/// Strict rule-set evaluation: `ALL` over no rules is true, `ANY` over no
/// rules is false.
pub fn matches_rule_set<S: FieldSource + ?Sized>(rule_set: &RuleSet, fields: &S) -> bool {
    RuleSetEvaluator::default().matches(rule_set, fields)
}
