use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rule::{Condition, Rule};
use crate::rules::field::{normalize_field_name, FieldKind, FieldSource, FieldValue};

/// How `greater_than` / `less_than` treat text-typed field values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericCoercion {
    /// Only number fields compare numerically; text never does.
    #[default]
    Strict,
    /// Numeric-looking text such as `"9.99"` is parsed before comparing.
    Lenient,
}

impl NumericCoercion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl FromStr for NumericCoercion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => {
                Err(format!("unsupported numeric coercion `{other}` (expected strict|lenient)"))
            }
        }
    }
}

/// A rule that could not be decided on its merits. It counts as not matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambiguity {
    pub field: String,
    pub condition: Condition,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Match,
    NoMatch,
    Ambiguous(Ambiguity),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }

    fn from_bool(matched: bool) -> Self {
        if matched {
            Self::Match
        } else {
            Self::NoMatch
        }
    }
}

/// Strict evaluation of a single rule.
pub fn evaluate<S: FieldSource + ?Sized>(rule: &Rule, record: &S) -> bool {
    evaluate_rule(rule, record, NumericCoercion::Strict).is_match()
}

pub fn evaluate_rule<S: FieldSource + ?Sized>(
    rule: &Rule,
    record: &S,
    coercion: NumericCoercion,
) -> Verdict {
    let field = normalize_field_name(&rule.field);
    let Some(actual) = record.field(&field) else {
        return Verdict::from_bool(rule.condition.holds_for_missing_field());
    };

    match rule.condition {
        Condition::Equals => Verdict::from_bool(equals(&actual, &rule.value)),
        Condition::NotEquals => Verdict::from_bool(!equals(&actual, &rule.value)),
        Condition::Contains => Verdict::from_bool(contains(&actual, &rule.value)),
        Condition::NotContains => Verdict::from_bool(!contains(&actual, &rule.value)),
        Condition::StartsWith => Verdict::from_bool(text_of(&actual).is_some_and(|text| {
            lowercase(text).starts_with(&lowercase(&rule.value))
        })),
        Condition::EndsWith => Verdict::from_bool(text_of(&actual).is_some_and(|text| {
            lowercase(text).ends_with(&lowercase(&rule.value))
        })),
        Condition::GreaterThan => compare(rule, &field, &actual, coercion, Ordering::Greater),
        Condition::LessThan => compare(rule, &field, &actual, coercion, Ordering::Less),
    }
}

fn equals(actual: &FieldValue, expected: &str) -> bool {
    match actual {
        FieldValue::Text(text) => text.trim().eq_ignore_ascii_case(expected.trim()),
        FieldValue::Number(number) => parse_number(expected).is_some_and(|value| *number == value),
        FieldValue::List(items) => {
            items.iter().any(|item| item.trim().eq_ignore_ascii_case(expected.trim()))
        }
        FieldValue::Flag(flag) => parse_flag(expected) == Some(*flag),
    }
}

fn contains(actual: &FieldValue, expected: &str) -> bool {
    match actual {
        FieldValue::Text(text) => lowercase(text).contains(&lowercase(expected)),
        FieldValue::List(items) => {
            items.iter().any(|item| item.trim().eq_ignore_ascii_case(expected.trim()))
        }
        FieldValue::Number(_) | FieldValue::Flag(_) => false,
    }
}

fn compare(
    rule: &Rule,
    field: &str,
    actual: &FieldValue,
    coercion: NumericCoercion,
    wanted: Ordering,
) -> Verdict {
    let ambiguous = |reason: String| {
        let field = field.to_string();
        Verdict::Ambiguous(Ambiguity { field, condition: rule.condition, reason })
    };

    let Some(threshold) = parse_number(&rule.value) else {
        return ambiguous(format!("rule value `{}` is not numeric", rule.value));
    };

    let left = match (actual, coercion) {
        (FieldValue::Number(number), _) => *number,
        (FieldValue::Text(text), NumericCoercion::Lenient) => match parse_number(text) {
            Some(number) => number,
            None => return ambiguous(format!("field value `{text}` is not numeric")),
        },
        (FieldValue::Text(text), NumericCoercion::Strict) => {
            return ambiguous(format!(
                "field holds text `{text}`; numeric comparison on text needs lenient coercion"
            ))
        }
        (other, _) => {
            return ambiguous(format!("{} fields cannot be compared numerically", other.kind()))
        }
    };

    Verdict::from_bool(left.cmp(&threshold) == wanted)
}

fn text_of(value: &FieldValue) -> Option<&str> {
    match value {
        FieldValue::Text(text) => Some(text.as_str()),
        _ => None,
    }
}

fn lowercase(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn parse_number(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)).ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "in_stock" => Some(true),
        "false" | "no" | "0" | "out_of_stock" => Some(false),
        _ => None,
    }
}

/// Whether an ordering condition can be decided against a field of `kind`.
pub(crate) fn orders_numerically(kind: FieldKind, coercion: NumericCoercion) -> bool {
    match kind {
        FieldKind::Number => true,
        FieldKind::Text => coercion == NumericCoercion::Lenient,
        FieldKind::List | FieldKind::Flag => false,
    }
}
