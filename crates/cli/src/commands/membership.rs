use std::collections::BTreeMap;
use std::path::Path;

use promo_core::config::AppConfig;
use promo_core::domain::product::{Product, ProductId};
use promo_core::errors::ApplicationError;
use promo_core::membership::{
    delta, AutomaticGroup, GroupId, MembershipDelta, MembershipRecomputer, MembershipReport,
};
use serde::Serialize;

use crate::commands::{read_json, CommandResult};

const COMMAND: &str = "membership";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MembershipOutput {
    #[serde(flatten)]
    report: MembershipReport,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    deltas: BTreeMap<GroupId, MembershipDelta>,
}

pub fn run(
    config: &AppConfig,
    groups_path: &Path,
    products_path: &Path,
    current_path: Option<&Path>,
) -> CommandResult {
    match recompute(config, groups_path, products_path, current_path) {
        Ok(output) => CommandResult::document(COMMAND, &output),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn recompute(
    config: &AppConfig,
    groups_path: &Path,
    products_path: &Path,
    current_path: Option<&Path>,
) -> Result<MembershipOutput, ApplicationError> {
    let groups: Vec<AutomaticGroup> = read_json(groups_path)?;
    let products: Vec<Product> = read_json(products_path)?;
    let current: BTreeMap<GroupId, Vec<ProductId>> = match current_path {
        Some(path) => read_json(path)?,
        None => BTreeMap::new(),
    };

    let report =
        MembershipRecomputer::new(config.rules.numeric_coercion).recompute(&groups, &products);

    let deltas = report
        .groups
        .iter()
        .filter_map(|membership| {
            let stored = current.get(&membership.group_id)?;
            Some((membership.group_id.clone(), delta(stored, &membership.members)))
        })
        .collect();

    tracing::info!(
        event_name = "cli.membership.completed",
        groups = report.groups.len(),
        failures = report.failures.len(),
        "automatic memberships recomputed"
    );

    Ok(MembershipOutput { report, deltas })
}
