use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::cart::LineItemId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid line item `{line_item_id}`: {reason}")]
    InvalidLineItem { line_item_id: LineItemId, reason: String },
    #[error("duplicate line item id `{0}`")]
    DuplicateLineItem(LineItemId),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("input failure: {0}")]
    Input(String),
}

impl ApplicationError {
    /// Stable classification used by operator tooling output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "invalid_cart",
            Self::Configuration(_) => "config_validation",
            Self::Input(_) => "input",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Input(_) => 3,
            Self::Domain(_) => 4,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => {
                "The cart could not be priced. Check line item prices and quantities."
            }
            Self::Configuration(_) => "The engine configuration is invalid.",
            Self::Input(_) => "The input files could not be read. Check paths and JSON shape.",
        }
    }
}
