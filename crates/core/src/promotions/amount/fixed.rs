use rust_decimal::Decimal;

use crate::domain::cart::LineItem;
use crate::domain::discount::Discount;
use crate::promotions::amount::LineDeduction;
use crate::promotions::money::{allocate, round_money};

/// A flat amount off the targeted subtotal, spread over the lines in
/// proportion to their totals.
pub(super) fn deductions(
    discount: &Discount,
    lines: &[&LineItem],
    scale: u32,
) -> Vec<LineDeduction> {
    let line_totals: Vec<Decimal> = lines.iter().map(|line| line.line_total()).collect();
    let matched_subtotal: Decimal = line_totals.iter().copied().sum();
    let amount = round_money(discount.value, scale).min(matched_subtotal);

    lines
        .iter()
        .zip(allocate(amount, &line_totals, scale))
        .map(|(line, amount)| LineDeduction { line_item_id: line.id.clone(), amount })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::deductions;
    use crate::domain::discount::{Discount, DiscountType};
    use crate::promotions::amount::test_support::line;

    #[test]
    fn distributes_proportionally_to_line_totals() {
        let lines = [
            line("l-1", "p-1", Decimal::from(30), 2),
            line("l-2", "p-2", Decimal::from(40), 1),
        ];
        let lines: Vec<_> = lines.iter().collect();
        let discount = Discount::new("d-fixed", DiscountType::Fixed, Decimal::from(20));

        let result = deductions(&discount, &lines, 2);

        assert_eq!(result[0].amount, Decimal::from(12));
        assert_eq!(result[1].amount, Decimal::from(8));
    }

    #[test]
    fn caps_at_matched_subtotal() {
        let lines = [line("l-1", "p-1", Decimal::new(1250, 2), 1)];
        let lines: Vec<_> = lines.iter().collect();
        let discount = Discount::new("d-fixed", DiscountType::Fixed, Decimal::from(50));

        let result = deductions(&discount, &lines, 2);

        assert_eq!(result[0].amount, Decimal::new(1250, 2));
    }

    #[test]
    fn residue_lands_on_largest_line() {
        let lines = [
            line("l-1", "p-1", Decimal::from(10), 1),
            line("l-2", "p-2", Decimal::from(10), 1),
            line("l-3", "p-3", Decimal::from(20), 1),
        ];
        let lines: Vec<_> = lines.iter().collect();
        let discount = Discount::new("d-fixed", DiscountType::Fixed, Decimal::new(1001, 2));

        let result = deductions(&discount, &lines, 2);
        let total: Decimal = result.iter().map(|deduction| deduction.amount).sum();

        assert_eq!(total, Decimal::new(1001, 2));
        assert_eq!(result[2].amount, Decimal::new(501, 2));
    }
}
