//! Rule-weighted regularity score.
//!
//! The deduction constants are fixed policy thresholds, applied in order and
//! clamped once at the end.

use crate::models::{CycleStats, Regularity};
use crate::stats::round_to;

/// Typical cycle length range.
pub const MIN_NORMAL_CYCLE: i64 = 21;
pub const MAX_NORMAL_CYCLE: i64 = 35;

const HIGH_VARIABILITY_STD: f64 = 7.0;
const MODERATE_VARIABILITY_STD: f64 = 4.0;
const HIGH_VARIABILITY_PENALTY: f64 = 0.3;
const MODERATE_VARIABILITY_PENALTY: f64 = 0.1;
const OUT_OF_RANGE_PENALTY: f64 = 0.4;
const SPAN_LIMIT: i64 = 14;
const SPAN_PENALTY: f64 = 0.2;
const REGULAR_THRESHOLD: f64 = 0.7;

pub const REGULAR_AFFIRMATION: &str = "Your cycles appear regular";

/// Score retained gap lengths against the regularity rules.
pub fn classify(lengths: &[i64], stats: &CycleStats) -> Regularity {
    let mut score = 1.0;
    let mut reasons = Vec::new();
    let std = stats.std_dev;

    if std > HIGH_VARIABILITY_STD {
        score -= HIGH_VARIABILITY_PENALTY;
        reasons.push(format!("High cycle variability (±{std:.1} days)"));
    } else if std > MODERATE_VARIABILITY_STD {
        score -= MODERATE_VARIABILITY_PENALTY;
        reasons.push(format!("Moderate cycle variability (±{std:.1} days)"));
    }

    let short = lengths.iter().filter(|&&l| l < MIN_NORMAL_CYCLE).count();
    let long = lengths.iter().filter(|&&l| l > MAX_NORMAL_CYCLE).count();
    if short + long > 0 && !lengths.is_empty() {
        score -= OUT_OF_RANGE_PENALTY * (short + long) as f64 / lengths.len() as f64;
        if short > 0 {
            reasons.push(format!(
                "Some cycles are shorter than {MIN_NORMAL_CYCLE} days (possible anovulation)"
            ));
        }
        if long > 0 {
            reasons.push(format!(
                "Some cycles are longer than {MAX_NORMAL_CYCLE} days (extended cycles)"
            ));
        }
    }

    let span = stats.longest - stats.shortest;
    if span > SPAN_LIMIT {
        score -= SPAN_PENALTY;
        reasons.push(format!(
            "Large variation between shortest and longest cycle ({span} days)"
        ));
    }

    let score = round_to(f64::clamp(score, 0.0, 1.0), 2);

    if reasons.is_empty() {
        reasons.push(REGULAR_AFFIRMATION.to_string());
    }

    Regularity {
        is_regular: score >= REGULAR_THRESHOLD && std <= HIGH_VARIABILITY_STD,
        score,
        reasons,
    }
}

/// Fallback when fewer than two plausible gaps exist.
pub fn insufficient(has_records: bool) -> Regularity {
    if has_records {
        Regularity {
            is_regular: false,
            score: 0.5,
            reasons: vec!["Need more data for accurate analysis".to_string()],
        }
    } else {
        Regularity {
            is_regular: false,
            score: 0.0,
            reasons: vec!["No cycle data available".to_string()],
        }
    }
}
