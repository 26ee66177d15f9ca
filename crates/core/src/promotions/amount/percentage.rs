use crate::domain::cart::LineItem;
use crate::domain::discount::Discount;
use crate::promotions::amount::LineDeduction;
use crate::promotions::money::{percent_of, round_money};

pub(super) fn deductions(
    discount: &Discount,
    lines: &[&LineItem],
    scale: u32,
) -> Vec<LineDeduction> {
    lines
        .iter()
        .map(|line| LineDeduction {
            line_item_id: line.id.clone(),
            amount: round_money(percent_of(line.line_total(), discount.value), scale)
                .min(line.line_total()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::deductions;
    use crate::domain::discount::{Discount, DiscountType};
    use crate::promotions::amount::test_support::line;

    #[test]
    fn rounds_each_line_half_up() {
        let lines = [
            line("l-1", "p-1", Decimal::new(1999, 2), 1),
            line("l-2", "p-2", Decimal::new(1005, 2), 1),
        ];
        let lines: Vec<_> = lines.iter().collect();
        let discount = Discount::new("d-15", DiscountType::Percentage, Decimal::from(15));

        let result = deductions(&discount, &lines, 2);

        // 19.99 * 15% = 2.9985, 10.05 * 15% = 1.5075
        assert_eq!(result[0].amount, Decimal::new(300, 2));
        assert_eq!(result[1].amount, Decimal::new(151, 2));
    }

    #[test]
    fn full_percentage_never_exceeds_line_total() {
        let lines = [line("l-1", "p-1", Decimal::new(3333, 3), 3)];
        let lines: Vec<_> = lines.iter().collect();
        let discount = Discount::new("d-100", DiscountType::Percentage, Decimal::ONE_HUNDRED);

        let result = deductions(&discount, &lines, 2);

        assert_eq!(result[0].amount, Decimal::new(9999, 3));
    }
}
