pub mod field;
pub mod predicate;
pub mod rule_set;
pub mod schema;

pub use field::{FieldKind, FieldSource, FieldValue};
pub use predicate::{evaluate, evaluate_rule, Ambiguity, NumericCoercion, Verdict};
pub use rule_set::{matches_rule_set, RuleSetEvaluator};
pub use schema::{line_item_schema, product_schema, BoundRecord, FieldSchema, RuleSetError};
