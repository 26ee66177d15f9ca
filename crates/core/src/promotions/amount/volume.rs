use tracing::info;

use crate::domain::discount::Discount;
use crate::promotions::amount::DiscountAmount;

/// Tiered quantity pricing. The tier contract is validated with the discount,
/// but tier selection is not evaluated yet, so the amount is always zero.
pub(super) fn evaluate(discount: &Discount) -> DiscountAmount {
    info!(
        event_name = "pricing.discount.not_implemented",
        discount_id = %discount.id,
        tiers = discount.volume_tiers.len(),
        "volume discount evaluated as zero"
    );
    DiscountAmount::not_implemented(discount)
}
