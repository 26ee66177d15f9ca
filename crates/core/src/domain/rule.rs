use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    StartsWith,
    EndsWith,
}

impl Condition {
    /// Conditions that hold when the field is absent from the record.
    pub fn holds_for_missing_field(self) -> bool {
        matches!(self, Self::NotEquals | Self::NotContains)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub condition: Condition,
    pub value: String,
}

impl Rule {
    pub fn new(field: impl Into<String>, condition: Condition, value: impl Into<String>) -> Self {
        Self { field: field.into(), condition, value: value.into() }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.condition, self.value)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    #[default]
    All,
    Any,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn all(rules: Vec<Rule>) -> Self {
        Self { match_type: MatchType::All, rules }
    }

    pub fn any(rules: Vec<Rule>) -> Self {
        Self { match_type: MatchType::Any, rules }
    }
}
