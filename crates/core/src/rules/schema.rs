use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::cart::LineItem;
use crate::domain::product::Product;
use crate::domain::rule::RuleSet;
use crate::rules::field::{normalize_field_name, FieldKind, FieldSource, FieldValue};
use crate::rules::predicate::{orders_numerically, Ambiguity, NumericCoercion};

pub type Accessor<T> = fn(&T) -> Option<FieldValue>;

struct FieldSpec<T> {
    kind: FieldKind,
    accessor: Accessor<T>,
}

/// The fields a rule may reference in one context (automatic collections,
/// discount targeting, ...), each with its declared kind and accessor.
pub struct FieldSchema<T> {
    name: &'static str,
    fields: BTreeMap<String, FieldSpec<T>>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("rule #{index} has an empty field name")]
    EmptyField { index: usize },
    #[error("rule #{index} references unknown {schema} field `{field}` (expected one of: {known})")]
    UnknownField { index: usize, schema: &'static str, field: String, known: String },
}

impl<T> FieldSchema<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, name: &str, kind: FieldKind, accessor: Accessor<T>) -> Self {
        self.fields.insert(normalize_field_name(name), FieldSpec { kind, accessor });
        self
    }

    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(&normalize_field_name(field)).map(|spec| spec.kind)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn bind<'a>(&'a self, record: &'a T) -> BoundRecord<'a, T> {
        BoundRecord { schema: self, record }
    }

    /// Rejects rule sets that reference fields this schema does not define.
    pub fn validate(&self, rule_set: &RuleSet) -> Result<(), RuleSetError> {
        for (index, rule) in rule_set.rules.iter().enumerate() {
            let field = normalize_field_name(&rule.field);
            if field.is_empty() {
                return Err(RuleSetError::EmptyField { index });
            }
            if !self.fields.contains_key(&field) {
                return Err(RuleSetError::UnknownField {
                    index,
                    schema: self.name,
                    field,
                    known: self.field_names().collect::<Vec<_>>().join(", "),
                });
            }
        }
        Ok(())
    }

    /// Ordering rules on fields that can never compare numerically under
    /// `coercion`. They are legal but always evaluate to no match.
    pub fn ambiguities(&self, rule_set: &RuleSet, coercion: NumericCoercion) -> Vec<Ambiguity> {
        rule_set
            .rules
            .iter()
            .filter(|rule| rule.condition.is_ordering())
            .filter_map(|rule| {
                let field = normalize_field_name(&rule.field);
                let kind = self.kind_of(&field)?;
                (!orders_numerically(kind, coercion)).then(|| Ambiguity {
                    field,
                    condition: rule.condition,
                    reason: format!("{kind} field in the {} schema is not numeric", self.name),
                })
            })
            .collect()
    }
}

impl<T> fmt::Debug for FieldSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|(name, spec)| (name, spec.kind)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A record viewed through a schema. Fields outside the schema read as missing.
pub struct BoundRecord<'a, T> {
    schema: &'a FieldSchema<T>,
    record: &'a T,
}

impl<T> FieldSource for BoundRecord<'_, T> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let spec = self.schema.fields.get(&normalize_field_name(name))?;
        (spec.accessor)(self.record)
    }
}

fn text(value: &Option<String>) -> Option<FieldValue> {
    value.as_ref().map(|value| FieldValue::Text(value.clone()))
}

pub fn product_schema() -> &'static FieldSchema<Product> {
    static SCHEMA: OnceLock<FieldSchema<Product>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        FieldSchema::<Product>::new("product")
            .with_field("title", FieldKind::Text, |product| Some(product.title.clone().into()))
            .with_field("price", FieldKind::Number, |product| Some(product.price.into()))
            .with_field("tag", FieldKind::List, |product| Some(product.tags.clone().into()))
            .with_field("sku", FieldKind::Text, |product| text(&product.sku))
            .with_field("status", FieldKind::Text, |product| Some(product.status.clone().into()))
            .with_field("availability", FieldKind::Flag, |product| Some(product.available.into()))
            .with_field("vendor", FieldKind::Text, |product| text(&product.vendor))
            .with_field("type", FieldKind::Text, |product| text(&product.product_type))
            .with_field("category", FieldKind::List, |product| {
                Some(FieldValue::List(product.category_ids.iter().map(|id| id.0.clone()).collect()))
            })
    })
}

pub fn line_item_schema() -> &'static FieldSchema<LineItem> {
    static SCHEMA: OnceLock<FieldSchema<LineItem>> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        FieldSchema::<LineItem>::new("line item")
            .with_field("product_id", FieldKind::Text, |line| {
                Some(line.product_id.0.clone().into())
            })
            .with_field("title", FieldKind::Text, |line| text(&line.title))
            .with_field("price", FieldKind::Number, |line| Some(line.price.into()))
            .with_field("quantity", FieldKind::Number, |line| {
                Some(FieldValue::Number(Decimal::from(line.quantity)))
            })
            .with_field("line_total", FieldKind::Number, |line| Some(line.line_total().into()))
            .with_field("tag", FieldKind::List, |line| Some(line.tags.clone().into()))
            .with_field("sku", FieldKind::Text, |line| text(&line.sku))
            .with_field("category", FieldKind::List, |line| {
                Some(FieldValue::List(line.category_ids.iter().map(|id| id.0.clone()).collect()))
            })
    })
}
