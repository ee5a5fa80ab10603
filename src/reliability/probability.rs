//! Probability Primitives
//!
//! Stateless reliability math: FIT-rate conversion, Poisson event
//! probabilities, the independent-union approximation, and the aggregate
//! FIT rate of an m-of-n redundant component group.

use crate::units::{BILLION, YEAR};

/// FIT rate corresponding to `events` occurring within `period` hours
pub fn fit_rate(events: f64, period: f64) -> f64 {
    events * BILLION / period
}

/// FIT rate corresponding to `events` per year
pub fn fit_rate_per_year(events: f64) -> f64 {
    fit_rate(events, YEAR)
}

/// Mean time to failure (hours) for a FIT rate
pub fn mttf(fits: f64) -> f64 {
    if fits <= 0.0 {
        f64::INFINITY
    } else {
        BILLION / fits
    }
}

/// Expected number of events for a FIT rate over `hours`
pub fn expected_events(fits: f64, hours: f64) -> f64 {
    fits * hours / BILLION
}

/// Probability of exactly `n` events when `expected` events are expected
///
/// `0^0` is taken as 1, so with nothing expected the probability of zero
/// events is 1 and of any other count 0.
pub fn poisson_pn(expected: f64, n: u32) -> f64 {
    if !(expected > 0.0) {
        return if n == 0 { 1.0 } else { 0.0 };
    }

    let p0 = (-expected).exp();
    if n == 0 {
        return p0;
    }

    // Each PMF term is <= 1, so the running product cannot overflow. A
    // subnormal e^-λ carries too few significant bits to start from.
    if p0 >= f64::MIN_POSITIVE {
        let mut p = p0;
        for k in 1..=n {
            p *= expected / f64::from(k);
        }
        return p.clamp(0.0, 1.0);
    }

    let mut log_p = -expected;
    for k in 1..=n {
        log_p += (expected / f64::from(k)).ln();
    }
    log_p.exp().clamp(0.0, 1.0)
}

/// Probability of exactly `n` failures within `hours` for a FIT rate
pub fn poisson_p(fits: f64, hours: f64, n: u32) -> f64 {
    poisson_pn(expected_events(fits, hours), n)
}

/// Probability of more than `n` failures within `hours` for a FIT rate
pub fn prob_at_least(fits: f64, hours: f64, n: u32) -> f64 {
    let expected = expected_events(fits, hours);

    // 1 - Σ cancels catastrophically when the tail is far below f64
    // resolution, so small tails are summed directly.
    if n > 0 && expected < f64::from(n) {
        return poisson_tail(expected, n);
    }

    let mut cumulative = 0.0;
    for k in 0..=n {
        cumulative += poisson_pn(expected, k);
    }
    (1.0 - cumulative).clamp(0.0, 1.0)
}

/// `Σ_{k>n} P(k)` for an expected count below `n`, where terms only shrink
fn poisson_tail(expected: f64, n: u32) -> f64 {
    let mut term = poisson_pn(expected, n + 1);
    let mut tail = 0.0;
    let mut k = n + 1;
    while term > tail * f64::EPSILON && k < n.saturating_add(MAX_TAIL_TERMS) {
        tail += term;
        k += 1;
        term *= expected / f64::from(k);
    }
    tail.clamp(0.0, 1.0)
}

/// Upper bound on terms summed for a Poisson tail
const MAX_TAIL_TERMS: u32 = 1_000;

/// Union of independent event probabilities: `1 - Π(1 - p)`
pub fn union_approx(probabilities: &[f64]) -> f64 {
    let survive: f64 = probabilities
        .iter()
        .map(|p| 1.0 - p.clamp(0.0, 1.0))
        .product();
    (1.0 - survive).clamp(0.0, 1.0)
}

/// Effective FIT rate of a group of `total` identical components of which
/// `required` must survive
///
/// Starts from the FIT rate of the whole group and, for every component the
/// group can lose before dropping below `required`, multiplies by the chance
/// of a further failure within the repair window. The `10e-9` scale is part
/// of the established model and downstream totals depend on it.
pub fn redundant_group_fit(fits: f64, total: u32, required: u32, repair_hours: f64) -> f64 {
    let mut group_fits = f64::from(total) * fits;
    let mut survivors = i64::from(total) - 1;
    while survivors >= i64::from(required) {
        let p_next_fail = survivors as f64 * fits * repair_hours * 10e-9;
        group_fits *= p_next_fail;
        survivors -= 1;
    }
    group_fits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::HOUR;

    #[test]
    fn test_fit_rate_one_per_year() {
        let fits = fit_rate_per_year(1.0);
        assert!((fits - 114_077.116_130_504_2).abs() < 1e-6);
        assert!((mttf(fits) - YEAR).abs() < 1e-6);
    }

    #[test]
    fn test_mttf_zero_rate() {
        assert!(mttf(0.0).is_infinite());
    }

    #[test]
    fn test_poisson_sums_to_one() {
        for &(fits, hours) in &[(1.0e6, 24.0), (6000.0, 8766.0), (4.0e9, 3.0)] {
            let total: f64 = (0..=50).map(|n| poisson_p(fits, hours, n)).sum();
            assert!((total - 1.0).abs() < 1e-9, "sum {} for {} FIT", total, fits);
        }
    }

    #[test]
    fn test_poisson_zero_expected() {
        assert_eq!(poisson_pn(0.0, 0), 1.0);
        assert_eq!(poisson_pn(0.0, 3), 0.0);
        assert_eq!(poisson_p(0.0, 24.0 * HOUR, 0), 1.0);
    }

    #[test]
    fn test_poisson_matches_pmf() {
        let lambda: f64 = 2.5;
        let expected = (-lambda).exp() * lambda.powi(3) / 6.0;
        assert!((poisson_pn(lambda, 3) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_poisson_large_lambda_stays_finite() {
        // e^-1000 underflows; the log-space path must still find the mode
        let p = poisson_pn(1000.0, 1000);
        assert!(p.is_finite());
        assert!((p - 0.012_614).abs() < 1e-5);
        assert_eq!(poisson_pn(1000.0, 0), 0.0);
    }

    #[test]
    fn test_poisson_subnormal_start_sums_to_one() {
        // e^-λ is subnormal for λ above ~708
        for &lambda in &[700.0, 709.0, 720.0, 740.0, 744.0] {
            let total: f64 = (0..3000).map(|k| poisson_pn(lambda, k)).sum();
            assert!((total - 1.0).abs() < 1e-9, "sum {} for λ={}", total, lambda);
        }
        let mode = poisson_pn(744.0, 744);
        assert!((mode - 0.014_624).abs() < 1e-5, "mode {}", mode);
    }

    #[test]
    fn test_prob_at_least_zero_is_complement() {
        for &(fits, hours) in &[(6000.0, 8766.0), (1.0, 1.0), (1.0e8, 0.5)] {
            assert_eq!(
                prob_at_least(fits, hours, 0),
                1.0 - poisson_p(fits, hours, 0)
            );
        }
    }

    #[test]
    fn test_prob_at_least_decreases_with_threshold() {
        let p0 = prob_at_least(1.0e8, 10.0, 0);
        let p1 = prob_at_least(1.0e8, 10.0, 1);
        let p2 = prob_at_least(1.0e8, 10.0, 2);
        assert!(p0 > p1 && p1 > p2);
        assert!((0.0..=1.0).contains(&p2));
    }

    #[test]
    fn test_prob_at_least_small_tail() {
        // λ = 0.5: direct tail agrees with the complement
        let direct = prob_at_least(0.5e9, 1.0, 2);
        let complement = 1.0 - (0..=2).map(|k| poisson_pn(0.5, k)).sum::<f64>();
        assert!((direct - complement).abs() < 1e-12);

        // λ = 1e-7: the complement would round to zero
        let tiny = prob_at_least(100.0, 1.0, 2);
        let leading = 1.0e-21 / 6.0;
        assert!(tiny > 0.0);
        assert!((tiny - leading).abs() / leading < 1e-6);
    }

    #[test]
    fn test_union_identity_and_bounds() {
        for &p in &[0.0, 0.25, 0.5, 1.0] {
            assert_eq!(union_approx(&[p, 0.0]), p);
        }
        for &(p1, p2) in &[(0.1, 0.2), (0.9, 0.5), (1.0e-9, 3.0e-9)] {
            let u = union_approx(&[p1, p2]);
            assert!(u >= f64::max(p1, p2) - 1e-15);
            assert!(u <= p1 + p2 + 1e-15);
        }
        assert_eq!(union_approx(&[]), 0.0);
    }

    #[test]
    fn test_redundant_group_fit() {
        // 2 supplies, 1 required: 2f * (1 * f * repair * 10e-9)
        let fits = redundant_group_fit(1642.0, 2, 1, 24.0);
        let expected = 2.0 * 1642.0 * (1642.0 * 24.0 * 10e-9);
        assert!((fits - expected).abs() < 1e-12);
    }

    #[test]
    fn test_redundant_group_without_redundancy() {
        assert_eq!(redundant_group_fit(200.0, 1, 1, 24.0), 200.0);
        assert_eq!(redundant_group_fit(200.0, 3, 3, 24.0), 600.0);
    }
}
