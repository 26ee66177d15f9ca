use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_ROUNDING_SCALE: u32 = 2;

/// Half-up rounding (midpoints away from zero) at `scale` decimal places.
#[inline]
pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

#[inline]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// `amount * numerator / denominator` for `numerator <= denominator`. Large
/// products fall back to multiplying by the ratio.
pub fn scale_by(amount: Decimal, numerator: Decimal, denominator: Decimal) -> Decimal {
    match amount.checked_mul(numerator) {
        Some(product) => product / denominator,
        None => amount * (numerator / denominator),
    }
}

/// Splits `total` across `capacities` proportionally.
///
/// Shares are rounded half-up at `scale` and never exceed their capacity. The
/// rounding residue is settled on the largest capacities first (ties go to the
/// earlier index), so the shares always sum to `total` exactly when `total` is
/// representable at `scale` and fits inside the summed capacities. A `total`
/// larger than the capacities is clamped to them.
pub fn allocate(total: Decimal, capacities: &[Decimal], scale: u32) -> Vec<Decimal> {
    let capacities: Vec<Decimal> =
        capacities.iter().map(|capacity| (*capacity).max(Decimal::ZERO)).collect();
    let capacity_sum: Decimal = capacities.iter().copied().sum();
    let mut shares = vec![Decimal::ZERO; capacities.len()];

    if capacity_sum <= Decimal::ZERO || total <= Decimal::ZERO {
        return shares;
    }

    let total = round_money(total, scale).min(capacity_sum);
    for (share, capacity) in shares.iter_mut().zip(&capacities) {
        *share = round_money(scale_by(total, *capacity, capacity_sum), scale).min(*capacity);
    }

    let mut order: Vec<usize> = (0..capacities.len()).collect();
    order.sort_by(|left, right| capacities[*right].cmp(&capacities[*left]).then(left.cmp(right)));

    let mut residue = total - shares.iter().copied().sum::<Decimal>();
    for index in order {
        if residue.is_zero() {
            break;
        }
        let step = if residue > Decimal::ZERO {
            residue.min(capacities[index] - shares[index])
        } else {
            residue.max(-shares[index])
        };
        shares[index] += step;
        residue -= step;
    }

    shares
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{allocate, percent_of, round_money, scale_by};

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_money(Decimal::new(1005, 3), 2), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(1004, 3), 2), Decimal::new(100, 2));
        assert_eq!(round_money(Decimal::new(25, 1), 0), Decimal::from(3));
    }

    #[test]
    fn percent_of_is_exact() {
        assert_eq!(percent_of(Decimal::from(500), Decimal::from(50)), Decimal::from(250));
        assert_eq!(percent_of(Decimal::new(1999, 2), Decimal::from(10)), Decimal::new(1999, 3));
    }

    #[test]
    fn scaling_large_amounts_does_not_overflow() {
        let large = Decimal::from_i128_with_scale(5 * 10_i128.pow(26), 0);
        assert_eq!(scale_by(large, large, large * Decimal::TWO), large / Decimal::TWO);
        let quarter = scale_by(Decimal::from(10), Decimal::ONE, Decimal::from(4));
        assert_eq!(quarter, Decimal::new(25, 1));

        let shares = allocate(large, &[large, large], 2);
        assert_eq!(shares.iter().copied().sum::<Decimal>(), large);
    }

    #[test]
    fn allocation_settles_rounding_residue() {
        let capacities = [Decimal::from(10), Decimal::from(10), Decimal::from(10)];
        let shares = allocate(Decimal::from(10), &capacities, 2);

        assert_eq!(shares.iter().copied().sum::<Decimal>(), Decimal::from(10));
        assert_eq!(shares[0], Decimal::new(334, 2));
        assert_eq!(shares[1], Decimal::new(333, 2));
        assert_eq!(shares[2], Decimal::new(333, 2));
    }

    #[test]
    fn allocation_never_exceeds_capacity() {
        let capacities = [Decimal::new(1, 2), Decimal::from(100)];
        let shares = allocate(Decimal::new(10050, 2), &capacities, 2);

        assert_eq!(shares, vec![Decimal::new(1, 2), Decimal::from(100)]);
    }

    #[test]
    fn allocation_over_empty_capacity_is_zero() {
        assert_eq!(allocate(Decimal::from(5), &[Decimal::ZERO], 2), vec![Decimal::ZERO]);
        assert!(allocate(Decimal::from(5), &[], 2).is_empty());
    }
}
