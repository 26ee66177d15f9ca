use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use promo_core::{
    evaluate_pricing, matches_rule_set, CartContext, CategoryId, Condition, CustomerId,
    CustomerRef, CustomerTarget, DiagnosticKind, Discount, DiscountId, DiscountTarget,
    DiscountType, DomainError, FieldValue, IneligibleReason, LineItem, LineItemId, MatchType,
    PricingResult, ProductId, Rule, RuleSet, UsageSnapshot,
};
use rust_decimal::Decimal;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).single().expect("valid timestamp")
}

fn line(id: &str, product: &str, price: i64, quantity: u32) -> LineItem {
    LineItem {
        id: LineItemId(id.to_string()),
        product_id: ProductId(product.to_string()),
        category_ids: Vec::new(),
        price: Decimal::from(price),
        quantity,
        tags: Vec::new(),
        sku: None,
        title: None,
    }
}

fn cart(lines: Vec<LineItem>) -> CartContext {
    CartContext { line_items: lines, customer: None, coupon_code: None, now: now() }
}

fn price(cart: &CartContext, discounts: &[Discount]) -> PricingResult {
    evaluate_pricing(cart, discounts, &UsageSnapshot::default()).expect("cart should price")
}

fn amount_on(result: &PricingResult, line_item_id: &str) -> Decimal {
    result
        .adjustments
        .iter()
        .filter(|entry| entry.line_item_id.0 == line_item_id)
        .map(|entry| entry.amount)
        .sum()
}

fn has_ineligible(result: &PricingResult, discount_id: &str, reason: IneligibleReason) -> bool {
    result.diagnostics.iter().any(|diagnostic| {
        diagnostic.kind == DiagnosticKind::Ineligible
            && diagnostic.discount_id == Some(DiscountId(discount_id.to_string()))
            && diagnostic.reason == Some(reason)
    })
}

#[test]
fn percentage_discount_is_capped_by_max_discount() {
    let mut discount = Discount::new("half-off", DiscountType::Percentage, Decimal::from(50));
    discount.max_discount = Some(Decimal::from(100));

    let result = price(&cart(vec![line("l-1", "coat", 500, 1)]), &[discount]);

    assert_eq!(result.subtotal, Decimal::from(500));
    assert_eq!(result.total_discount, Decimal::from(100));
    assert_eq!(result.total, Decimal::from(400));
    assert_eq!(result.applied_discounts.len(), 1);
    assert_eq!(result.applied_discounts[0].amount, Decimal::from(100));
}

#[test]
fn buy_two_get_one_free_discounts_two_units_of_five() {
    let mut discount = Discount::new("b2g1", DiscountType::BuyXGetY, Decimal::ZERO);
    discount.buy_quantity = Some(2);
    discount.get_quantity = Some(1);
    discount.get_discount_percent = Some(Decimal::ONE_HUNDRED);

    let result = price(&cart(vec![line("l-1", "socks", 30, 5)]), &[discount]);

    assert_eq!(result.total_discount, Decimal::from(60));
    assert_eq!(result.total, Decimal::from(90));
}

#[test]
fn higher_priority_exclusive_discount_wins_and_loser_is_reported() {
    let mut strong = Discount::new("strong", DiscountType::Percentage, Decimal::from(20));
    strong.priority = 10;
    let mut weak = Discount::new("weak", DiscountType::Percentage, Decimal::from(50));
    weak.priority = 5;

    let result = price(&cart(vec![line("l-1", "lamp", 200, 1)]), &[weak, strong]);

    assert_eq!(result.total_discount, Decimal::from(40));
    assert_eq!(result.applied_discounts[0].discount_id, DiscountId("strong".to_string()));
    assert!(result.diagnostics.iter().any(|diagnostic| {
        diagnostic.kind == DiagnosticKind::StackingConflict
            && diagnostic.discount_id == Some(DiscountId("weak".to_string()))
    }));
}

#[test]
fn combinable_discounts_stack_on_the_reduced_price() {
    let mut first = Discount::new("first", DiscountType::Percentage, Decimal::from(10));
    first.priority = 2;
    first.can_combine = true;
    let mut second = Discount::new("second", DiscountType::Fixed, Decimal::from(15));
    second.priority = 1;
    second.can_combine = true;

    let result = price(&cart(vec![line("l-1", "desk", 100, 1)]), &[first, second]);

    assert_eq!(result.total_discount, Decimal::from(25));
    assert_eq!(result.total, Decimal::from(75));
    assert_eq!(result.applied_discounts.len(), 2);
}

#[test]
fn every_third_cheapest_unit_is_discounted() {
    let discount = {
        let mut discount =
            Discount::new("third-free", DiscountType::NthItemDiscount, Decimal::ONE_HUNDRED);
        discount.nth_item = Some(3);
        discount
    };
    let cart = cart(vec![
        line("a", "p-a", 10, 1),
        line("b", "p-b", 10, 1),
        line("c", "p-c", 20, 1),
        line("d", "p-d", 20, 1),
        line("e", "p-e", 30, 1),
    ]);

    let result = price(&cart, &[discount]);

    assert_eq!(result.total_discount, Decimal::from(20));
    assert_eq!(amount_on(&result, "c"), Decimal::from(20));
    assert_eq!(amount_on(&result, "d"), Decimal::ZERO);
}

#[test]
fn fixed_discount_never_exceeds_the_targeted_lines() {
    let discount = Discount::new("big-fixed", DiscountType::Fixed, Decimal::from(1000));

    let result = price(&cart(vec![line("l-1", "mug", 12, 2)]), &[discount]);

    assert_eq!(result.total_discount, Decimal::from(24));
    assert_eq!(result.total, Decimal::ZERO);
}

#[test]
fn category_target_only_touches_matching_lines() {
    let mut discount = Discount::new("shoes", DiscountType::Percentage, Decimal::from(10));
    discount.target = DiscountTarget::SpecificCategories;
    discount.category_ids = vec![CategoryId("shoes".to_string())];

    let mut boots = line("boots", "p-boots", 300, 1);
    boots.category_ids = vec![CategoryId("shoes".to_string())];
    let result = price(&cart(vec![boots, line("hat", "p-hat", 80, 1)]), &[discount]);

    assert_eq!(amount_on(&result, "boots"), Decimal::from(30));
    assert_eq!(amount_on(&result, "hat"), Decimal::ZERO);
}

#[test]
fn product_rules_with_unknown_field_skip_the_discount() {
    let mut discount = Discount::new("odd-rules", DiscountType::Percentage, Decimal::from(10));
    discount.product_rules =
        Some(RuleSet::all(vec![Rule::new("colour", Condition::Equals, "red")]));

    let result = price(&cart(vec![line("l-1", "scarf", 40, 1)]), &[discount]);

    assert_eq!(result.total_discount, Decimal::ZERO);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::Configuration);
}

#[test]
fn non_numeric_threshold_fails_closed() {
    let mut discount = Discount::new("cheap-only", DiscountType::Percentage, Decimal::from(10));
    discount.product_rules =
        Some(RuleSet::all(vec![Rule::new("price", Condition::LessThan, "cheap")]));

    let result = price(&cart(vec![line("l-1", "scarf", 40, 1)]), &[discount]);

    assert_eq!(result.total_discount, Decimal::ZERO);
    assert!(result
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::EvaluationAmbiguity));
    assert!(result
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::NoMatchingLines));
}

#[test]
fn empty_rule_sets_follow_all_true_any_false() {
    let record: BTreeMap<String, FieldValue> = BTreeMap::new();

    assert!(matches_rule_set(&RuleSet { match_type: MatchType::All, rules: Vec::new() }, &record));
    assert!(!matches_rule_set(&RuleSet { match_type: MatchType::Any, rules: Vec::new() }, &record));
}

#[test]
fn coupon_discount_requires_a_matching_code() {
    let mut discount = Discount::new("welcome", DiscountType::Fixed, Decimal::from(5));
    discount.is_automatic = false;
    discount.code = Some("WELCOME5".to_string());
    let discounts = [discount];

    let without_code = price(&cart(vec![line("l-1", "tea", 20, 1)]), &discounts);
    assert!(has_ineligible(&without_code, "welcome", IneligibleReason::CouponMissing));

    let mut wrong = cart(vec![line("l-1", "tea", 20, 1)]);
    wrong.coupon_code = Some("HELLO".to_string());
    let mismatched = price(&wrong, &discounts);
    assert!(has_ineligible(&mismatched, "welcome", IneligibleReason::CouponMismatch));

    let mut matching = cart(vec![line("l-1", "tea", 20, 1)]);
    matching.coupon_code = Some(" welcome5 ".to_string());
    assert_eq!(price(&matching, &discounts).total_discount, Decimal::from(5));
}

#[test]
fn date_window_and_minimum_order_gate_eligibility() {
    let mut expired = Discount::new("expired", DiscountType::Fixed, Decimal::from(5));
    expired.end_date = Some(now() - Duration::days(1));
    let mut upcoming = Discount::new("upcoming", DiscountType::Fixed, Decimal::from(5));
    upcoming.start_date = Some(now() + Duration::days(1));
    let mut minimum = Discount::new("minimum", DiscountType::Fixed, Decimal::from(5));
    minimum.min_order_amount = Some(Decimal::from(100));

    let result = price(&cart(vec![line("l-1", "pen", 30, 1)]), &[expired, upcoming, minimum]);

    assert_eq!(result.total_discount, Decimal::ZERO);
    assert!(has_ineligible(&result, "expired", IneligibleReason::Expired));
    assert!(has_ineligible(&result, "upcoming", IneligibleReason::NotStarted));
    assert!(has_ineligible(&result, "minimum", IneligibleReason::BelowMinimumOrder));
}

#[test]
fn customer_tier_and_usage_limits_gate_eligibility() {
    let mut gold_only = Discount::new("gold", DiscountType::Fixed, Decimal::from(5));
    gold_only.customer_target = CustomerTarget::CustomerTiers;
    gold_only.customer_tiers = vec!["gold".to_string()];
    let mut once = Discount::new("once", DiscountType::Fixed, Decimal::from(5));
    once.can_combine = true;
    once.uses_per_customer = 1;
    gold_only.can_combine = true;

    let mut silver_cart = cart(vec![line("l-1", "pen", 30, 1)]);
    silver_cart.customer =
        Some(CustomerRef { id: CustomerId("c-1".to_string()), tier: Some("silver".to_string()) });
    let usage = UsageSnapshot::default().record_customer("c-1", "once", 1);

    let result = evaluate_pricing(&silver_cart, &[gold_only, once], &usage).expect("priced");

    assert_eq!(result.total_discount, Decimal::ZERO);
    assert!(has_ineligible(&result, "gold", IneligibleReason::CustomerNotTargeted));
    assert!(has_ineligible(&result, "once", IneligibleReason::CustomerLimitReached));
}

#[test]
fn volume_discount_is_reported_as_not_implemented() {
    let mut discount = Discount::new("bulk", DiscountType::VolumeDiscount, Decimal::ZERO);
    discount.volume_tiers = vec![promo_core::VolumeTier {
        min_qty: 10,
        discount_percent: Decimal::from(15),
    }];

    let result = price(&cart(vec![line("l-1", "bolt", 1, 40)]), &[discount]);

    assert_eq!(result.total_discount, Decimal::ZERO);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::NotImplemented);
}

#[test]
fn invalid_cart_is_rejected_before_pricing() {
    let cart = cart(vec![line("l-1", "pen", 3, 0)]);
    assert!(evaluate_pricing(&cart, &[], &UsageSnapshot::default()).is_err());
}

#[test]
fn carts_beyond_decimal_range_are_rejected_instead_of_priced() {
    let mut huge = line("l-1", "yacht", 0, 3);
    huge.price = Decimal::from_i128_with_scale(3 * 10_i128.pow(28), 0);
    let overflowing = cart(vec![huge]);
    assert!(matches!(
        evaluate_pricing(&overflowing, &[], &UsageSnapshot::default()),
        Err(DomainError::InvalidLineItem { .. })
    ));

    let mut pricey = line("l-1", "island", 0, 1);
    pricey.price = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
    let everything_off = Discount::new("all-off", DiscountType::Percentage, Decimal::ONE_HUNDRED);
    assert!(evaluate_pricing(&cart(vec![pricey]), &[everything_off], &UsageSnapshot::default())
        .is_err());
}
