//! Stacking-penalty aggregation.
//!
//! Pure function over a list of multiplier values; has no knowledge of
//! holders, items, or the link tracker.

/// Aggregates a penalized chain of multiplier-values (each already
/// `value - 1`, i.e. "percent-as-fraction") into a single multiplier.
///
/// `penalty_base` is the stacking-penalty exponent base
/// (`exp(-(1/2.67)^2)` by default, configurable via `EngineSettings`);
/// `max_counted` is the per-chain cutoff (11 by default).
pub fn stacking_multiplier(values: &[f64], penalty_base: f64, max_counted: usize) -> f64 {
    let mut positive: Vec<f64> = values.iter().copied().filter(|v| *v >= 0.0).collect();
    let mut negative: Vec<f64> = values.iter().copied().filter(|v| *v < 0.0).collect();

    positive.sort_by(|a, b| b.partial_cmp(a).unwrap());
    negative.sort_by(|a, b| a.partial_cmp(b).unwrap());

    chain_multiplier(&positive, penalty_base, max_counted)
        * chain_multiplier(&negative, penalty_base, max_counted)
}

fn chain_multiplier(chain: &[f64], penalty_base: f64, max_counted: usize) -> f64 {
    let mut acc = 1.0;
    for (i, value) in chain.iter().enumerate() {
        if i >= max_counted {
            break;
        }
        let exponent = (i * i) as f64;
        acc *= 1.0 + value * penalty_base.powf(exponent);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn penalty_base() -> f64 {
        (-(1.0_f64 / 2.67).powi(2)).exp()
    }

    #[test]
    fn single_modifier_is_unpenalized() {
        let m = stacking_multiplier(&[0.10], penalty_base(), 11);
        assert!((m - 1.10).abs() < 1e-9);
    }

    #[test]
    fn two_equal_ten_percent_bonuses() {
        let p = penalty_base();
        let m = stacking_multiplier(&[0.10, 0.10], p, 11);
        let expected = (1.0 + 0.10 * p.powf(0.0)) * (1.0 + 0.10 * p.powf(1.0));
        assert!((m - expected).abs() < 1e-12);
        assert!((m - 1.1956).abs() < 1e-3);
    }

    #[test]
    fn positive_and_negative_chains_are_independent() {
        let p = penalty_base();
        let m = stacking_multiplier(&[0.20, -0.10], p, 11);
        let expected = (1.0 + 0.20) * (1.0 - 0.10);
        assert!((m - expected).abs() < 1e-12);
    }

    #[test]
    fn chain_beyond_eleven_modifiers_is_capped() {
        let p = penalty_base();
        let many = vec![0.05; 20];
        let capped = stacking_multiplier(&many, p, 11);
        let eleven = vec![0.05; 11];
        let expected = stacking_multiplier(&eleven, p, 11);
        assert!((capped - expected).abs() < 1e-12);
    }
}
