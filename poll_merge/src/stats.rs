//! Sampling statistics for reported voting intentions.
//!
//! Intentions are given in percent (0-100). Intervals are returned as proportions (0-1).

use statrs::function::erf::erfc;

/// Critical value of the 95% confidence level.
pub const DEFAULT_Z: f64 = 1.96;

/// Proportion used as the null hypothesis of the significance test.
pub const DEFAULT_NULL_PROPORTION: f64 = 0.5;

/// Threshold under which a p-value is considered significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// A confidence interval, in proportion units, clipped to [0, 1].
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn rounded(&self, decimals: i32) -> ConfidenceInterval {
        ConfidenceInterval {
            lower: round_to(self.lower, decimals),
            upper: round_to(self.upper, decimals),
        }
    }
}

/// The p-value of a reported intention and whether it is significant.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Significance {
    pub p_value: f64,
    pub significant: bool,
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

fn valid_inputs(intention_percent: f64, sample_size: f64) -> Option<f64> {
    if !(0.0..=100.0).contains(&intention_percent) || !sample_size.is_finite() || sample_size <= 0.0
    {
        return None;
    }
    Some(intention_percent / 100.0)
}

/// Normal-approximation confidence interval of a reported intention.
///
/// Returns None if the intention is outside [0, 100] or the sample size is not positive.
///
/// ```
/// use poll_merge::stats::*;
///
/// let ci = compute_interval(20.0, 1000.0, DEFAULT_Z).unwrap().rounded(3);
/// assert_eq!((ci.lower, ci.upper), (0.175, 0.225));
/// ```
pub fn compute_interval(
    intention_percent: f64,
    sample_size: f64,
    z: f64,
) -> Option<ConfidenceInterval> {
    let p = valid_inputs(intention_percent, sample_size)?;
    let margin = z * (p * (1.0 - p) / sample_size).sqrt();
    Some(ConfidenceInterval {
        lower: (p - margin).max(0.0),
        upper: (p + margin).min(1.0),
    })
}

/// Two-sided p-value of the z-test of the intention against a null proportion.
pub fn compute_p_value(
    intention_percent: f64,
    sample_size: f64,
    null_proportion: f64,
) -> Option<f64> {
    let p = valid_inputs(intention_percent, sample_size)?;
    if !(null_proportion > 0.0 && null_proportion < 1.0) {
        return None;
    }
    let se = (null_proportion * (1.0 - null_proportion) / sample_size).sqrt();
    let z = (p - null_proportion) / se;
    Some((2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0))
}

/// The p-value against the 50% baseline and its significance at the 5% level.
pub fn significance(intention_percent: f64, sample_size: f64) -> Option<Significance> {
    let p_value = compute_p_value(intention_percent, sample_size, DEFAULT_NULL_PROPORTION)?;
    Some(Significance {
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

/// Cumulative distribution function of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}
