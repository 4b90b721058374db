//! Constrained random stat generation.
//!
//! Produces raw stat values whose floored average (after scaling to each
//! stat's integer width) lands exactly on a target mean drawn from a rarity
//! band. The distribution walk is random but the realized average is
//! enforced by a convergence loop, so decode-side rarity derivation always
//! agrees with the rarity requested at encode time.

use rand::Rng;
use rand_distr::Normal;

use crate::error::{DnaError, DnaResult};

/// Hard cap on distribution rounds before giving up.
///
/// The convergence loop is bounded by construction for sane inputs; the cap
/// turns a pathological `(mean, n_stats, max_stat_value)` combination into
/// a loud error instead of a hang.
pub const MAX_DISTRIBUTION_ROUNDS: u32 = 10_000;

const MAX_NORMAL_RESAMPLES: u32 = 32;

/// Uniform integer in `[min, max]`, or `[min, max)` when `exclude_max`.
pub(crate) fn random_int<R: Rng + ?Sized>(
    rng: &mut R,
    min: i64,
    max: i64,
    exclude_max: bool,
) -> i64 {
    let max = if exclude_max { max - 1 } else { max };
    let max = max.max(min);
    rng.gen_range(min..=max)
}

/// Draws a rounded normal sample with the given mean and spread, resampling
/// a bounded number of times until the sample falls inside `[min, max]`
/// and clamping if it never does.
fn bounded_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
) -> i64 {
    let Ok(normal) = Normal::new(mean, std_dev.max(1.0)) else {
        return mean.round() as i64;
    };
    for _ in 0..MAX_NORMAL_RESAMPLES {
        let sample = rng.sample(normal);
        if sample >= min && sample <= max {
            return sample.round() as i64;
        }
    }
    rng.sample(normal).clamp(min, max).round() as i64
}

/// Generates one raw stat value per entry of `max_value_per_stat`, such
/// that the floored percentage average of the raw values equals a target
/// mean drawn uniformly from `range` (inclusive both ends), or given by
/// `mean_preset`.
///
/// Each stat is a percentage in spirit; the returned values are already
/// scaled into each stat's integer width (`round(percent / 100 * max)`),
/// ready for field packing or direct storage.
///
/// A single-stat cap is drawn in `[mean + 1, 100]` so the value 100 is not
/// over-represented in the output distribution (unless the mean itself
/// is 100).
pub fn generate_stats<R: Rng + ?Sized>(
    rng: &mut R,
    max_value_per_stat: &[i64],
    range: [f64; 2],
    mean_preset: Option<i64>,
) -> DnaResult<Vec<i64>> {
    let n_stats = max_value_per_stat.len();
    let mean = mean_preset.unwrap_or_else(|| random_int(rng, range[0] as i64, range[1] as i64, false));
    let total_points = mean * n_stats as i64;
    let max_stat_value = random_int(rng, (mean + 1).min(100), 100, false);

    let mut stats = vec![0i64; n_stats];
    let mut points_left = total_points;
    let mut raw: Vec<i64> = Vec::new();
    let mut rounds = 0u32;

    while points_left != 0 {
        rounds += 1;
        if rounds > MAX_DISTRIBUTION_ROUNDS {
            return Err(DnaError::GenerationDidNotConverge {
                rounds: rounds - 1,
                mean,
                n_stats,
            });
        }

        while points_left != 0 {
            if points_left < 0 {
                return Err(DnaError::GenerationDidNotConverge {
                    rounds,
                    mean,
                    n_stats,
                });
            }
            let index = random_int(rng, 0, n_stats as i64, true) as usize;
            let room = points_left.min(max_stat_value - stats[index]);
            if room == 0 {
                continue;
            }
            let spread = (room as f64 / n_stats as f64).ceil();
            // Bounded both ways: more than the room left would push the
            // point budget negative, and a stat below zero would not fit
            // its gene width at pack time.
            let points =
                bounded_normal(rng, 1.0, spread, -100.0, 200.0).clamp(-stats[index], room);
            stats[index] += points;
            points_left -= points;
        }

        raw = scale_raw(&stats, max_value_per_stat);
        let average = (average_from_raw(&raw, max_value_per_stat) * 100.0).floor() as i64;
        // Points are distributed on the percentage stats but the average is
        // checked on the width-scaled raw stats; rounding can shift the
        // floored average by one.
        if average != mean {
            points_left += 1;
        }
    }

    // A target mean of 0 never enters the loop; the raw vector still has
    // to be materialized from the all-zero percentages.
    if raw.is_empty() {
        raw = scale_raw(&stats, max_value_per_stat);
    }
    Ok(raw)
}

/// Mean completeness of raw values against their per-stat maxima, in
/// `[0, 1]`. Multiply by 100 for a percentage.
pub fn average_from_raw(raw: &[i64], max_value_per_stat: &[i64]) -> f64 {
    let sum: f64 = raw
        .iter()
        .zip(max_value_per_stat)
        .map(|(value, max)| *value as f64 / *max as f64)
        .sum();
    sum / raw.len() as f64
}

fn scale_raw(stats: &[i64], max_value_per_stat: &[i64]) -> Vec<i64> {
    stats
        .iter()
        .zip(max_value_per_stat)
        .map(|(stat, max)| (*stat as f64 / 100.0 * *max as f64).round() as i64)
        .collect()
}
