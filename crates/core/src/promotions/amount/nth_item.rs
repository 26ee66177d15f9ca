use rust_decimal::Decimal;

use crate::domain::cart::LineItem;
use crate::domain::discount::Discount;
use crate::promotions::amount::LineDeduction;
use crate::promotions::money::{percent_of, round_money};

/// Units are ordered by unit price ascending (stable on cart order); every
/// 1-based position that is a multiple of `nthItem` gets `value`% off.
pub(super) fn deductions(
    discount: &Discount,
    lines: &[&LineItem],
    scale: u32,
) -> Vec<LineDeduction> {
    let Some(nth) = discount.nth_item.filter(|nth| *nth > 0).map(u64::from) else {
        return Vec::new();
    };

    let mut ordered: Vec<usize> = (0..lines.len()).collect();
    ordered.sort_by(|left, right| lines[*left].price.cmp(&lines[*right].price));

    let mut hits = vec![0_u64; lines.len()];
    let mut position = 0_u64;
    for index in ordered {
        let quantity = u64::from(lines[index].quantity);
        hits[index] = (position + quantity) / nth - position / nth;
        position += quantity;
    }

    lines
        .iter()
        .zip(hits)
        .filter(|(_, hits)| *hits > 0)
        .map(|(line, hits)| {
            let discounted_value = line.price * Decimal::from(hits);
            LineDeduction {
                line_item_id: line.id.clone(),
                amount: round_money(percent_of(discounted_value, discount.value), scale)
                    .min(line.line_total()),
            }
        })
        .collect()
}
