use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::cart::LineItem;
use crate::domain::discount::Discount;
use crate::domain::product::ProductId;
use crate::promotions::amount::LineDeduction;
use crate::promotions::money::{percent_of, round_money};

/// Per product: every complete group of `buyQuantity` units earns
/// `getQuantity` discounted units, taken from the cheapest units first.
pub(super) fn deductions(
    discount: &Discount,
    lines: &[&LineItem],
    scale: u32,
) -> Vec<LineDeduction> {
    let (Some(buy), Some(get), Some(percent)) =
        (discount.buy_quantity, discount.get_quantity, discount.get_discount_percent)
    else {
        return Vec::new();
    };
    if buy == 0 {
        return Vec::new();
    }

    let mut products: BTreeMap<&ProductId, Vec<usize>> = BTreeMap::new();
    for (index, line) in lines.iter().enumerate() {
        products.entry(&line.product_id).or_default().push(index);
    }

    let mut discounted_units = vec![0_u64; lines.len()];
    for indexes in products.values() {
        let total_quantity: u64 =
            indexes.iter().map(|index| u64::from(lines[*index].quantity)).sum();
        let groups = total_quantity / u64::from(buy);
        let mut remaining = (groups * u64::from(get)).min(total_quantity);

        let mut cheapest_first = indexes.clone();
        cheapest_first.sort_by(|left, right| {
            lines[*left].price.cmp(&lines[*right].price).then(left.cmp(right))
        });
        for index in cheapest_first {
            if remaining == 0 {
                break;
            }
            let units = remaining.min(u64::from(lines[index].quantity));
            discounted_units[index] = units;
            remaining -= units;
        }
    }

    lines
        .iter()
        .zip(discounted_units)
        .filter(|(_, units)| *units > 0)
        .map(|(line, units)| {
            let discounted_value = line.price * Decimal::from(units);
            LineDeduction {
                line_item_id: line.id.clone(),
                amount: round_money(percent_of(discounted_value, percent), scale)
                    .min(line.line_total()),
            }
        })
        .collect()
}
