use std::path::Path;

use promo_core::config::AppConfig;
use promo_core::domain::cart::CartContext;
use promo_core::domain::discount::Discount;
use promo_core::domain::usage::UsageSnapshot;
use promo_core::errors::ApplicationError;
use promo_core::promotions::{DefaultPricingPipeline, PricingPipeline, PricingResult};

use crate::commands::{read_json, CommandResult};

const COMMAND: &str = "evaluate";

pub fn run(
    config: &AppConfig,
    cart_path: &Path,
    discounts_path: &Path,
    usage_path: Option<&Path>,
) -> CommandResult {
    match price(config, cart_path, discounts_path, usage_path) {
        Ok(result) => CommandResult::document(COMMAND, &result),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn price(
    config: &AppConfig,
    cart_path: &Path,
    discounts_path: &Path,
    usage_path: Option<&Path>,
) -> Result<PricingResult, ApplicationError> {
    let cart: CartContext = read_json(cart_path)?;
    let discounts: Vec<Discount> = read_json(discounts_path)?;
    let usage: UsageSnapshot = match usage_path {
        Some(path) => read_json(path)?,
        None => UsageSnapshot::default(),
    };

    let pipeline = DefaultPricingPipeline::from_config(config);
    let result = pipeline.evaluate(&cart, &discounts, &usage)?;

    tracing::info!(
        event_name = "cli.evaluate.completed",
        discounts = discounts.len(),
        applied = result.applied_discounts.len(),
        diagnostics = result.diagnostics.len(),
        total_discount = %result.total_discount,
        "pricing preview computed"
    );

    Ok(result)
}
