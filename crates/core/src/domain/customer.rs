use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The registered customer behind a cart. Guests carry no reference at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: CustomerId,
    #[serde(default)]
    pub tier: Option<String>,
}

impl CustomerRef {
    pub fn in_tier(&self, tiers: &[String]) -> bool {
        let Some(tier) = self.tier.as_deref() else {
            return false;
        };
        let tier = tier.trim();
        tiers.iter().any(|candidate| candidate.trim().eq_ignore_ascii_case(tier))
    }
}
