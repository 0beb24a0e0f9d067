use chrono::{Duration, NaiveDate};

use crate::models::{CycleRecord, Prediction};
use crate::stats::{
    cycle_gaps, mean, period_summary, round_days, round_to, std_deviation, DEFAULT_CYCLE_LENGTH,
};

/// Number of cycles at which sample size alone stops limiting confidence.
pub const FULL_CONFIDENCE_SAMPLE: usize = 6;

const NO_GAP_CONFIDENCE: f64 = 0.3;
const FALLBACK_MARGIN: i64 = 5;
const MIN_MARGIN: i64 = 2;

/// Predict the next onset from records sorted by start date.
/// Returns `None` only when there are no records at all.
pub fn predict(records: &[CycleRecord]) -> Option<Prediction> {
    let last = records.last()?;
    let lengths = cycle_gaps(records).lengths;
    let avg_period = period_summary(records).average;

    Some(predict_from_gaps(&lengths, last.start_date, avg_period))
}

/// Predict from already-filtered chronological gaps. Without a usable gap,
/// whether from a lone record or a fully filtered history, a default-length
/// cycle is assumed.
pub fn predict_from_gaps(lengths: &[i64], last_start: NaiveDate, avg_period: f64) -> Prediction {
    let Some(internals) = calc_internals(lengths) else {
        tracing::debug!("no usable cycle gaps, predicting a default-length cycle");
        let predicted_start = last_start + Duration::days(DEFAULT_CYCLE_LENGTH);
        return build(predicted_start, FALLBACK_MARGIN, NO_GAP_CONFIDENCE, avg_period);
    };

    let predicted_start = last_start + Duration::days(round_days(internals.weighted_mean));

    let consistency = (1.0 - internals.std_dev / 10.0).max(0.0);
    let sample_sufficiency = (internals.sample as f64 / FULL_CONFIDENCE_SAMPLE as f64).min(1.0);
    let confidence = round_to(consistency * 0.6 + sample_sufficiency * 0.4, 2);

    let margin = round_days(internals.std_dev).max(MIN_MARGIN);

    build(predicted_start, margin, confidence, avg_period)
}

fn build(predicted_start: NaiveDate, margin: i64, confidence: f64, avg_period: f64) -> Prediction {
    let predicted_end = predicted_start + Duration::days((round_days(avg_period) - 1).max(0));

    Prediction {
        predicted_start,
        predicted_end,
        confidence,
        range_start: predicted_start - Duration::days(margin),
        range_end: predicted_start + Duration::days(margin),
    }
}

struct PredictionInternals {
    weighted_mean: f64,
    std_dev: f64,
    sample: usize,
}

fn calc_internals(lengths: &[i64]) -> Option<PredictionInternals> {
    if lengths.is_empty() {
        return None;
    }

    let values: Vec<f64> = lengths.iter().map(|&l| l as f64).collect();

    Some(PredictionInternals {
        weighted_mean: recency_weighted_mean(&values),
        std_dev: std_deviation(&values),
        sample: values.len(),
    })
}

/// Mean with linear weights `1..=n`; the most recent value weighs `n`.
fn recency_weighted_mean(values: &[f64]) -> f64 {
    let weights: Vec<f64> = (1..=values.len()).map(|w| w as f64).collect();
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return mean(values);
    }
    values
        .iter()
        .zip(&weights)
        .map(|(v, w)| v * (w / total))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlowLevel;

    fn make_cycle(start: &str, end: &str) -> CycleRecord {
        CycleRecord::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            Some(NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap()),
            FlowLevel::Medium,
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn no_prediction_without_records() {
        assert!(predict(&[]).is_none());
    }

    #[test]
    fn single_record_uses_default_length() {
        let cycles = vec![make_cycle("2026-01-01", "2026-01-05")];
        let pred = predict(&cycles).unwrap();
        assert_eq!(pred.predicted_start, date("2026-01-29"));
        assert_eq!(pred.confidence, 0.3);
        assert_eq!(pred.range_start, date("2026-01-24"));
        assert_eq!(pred.range_end, date("2026-02-03"));
    }

    #[test]
    fn filtered_history_uses_default_length() {
        let cycles = vec![
            make_cycle("2026-01-01", "2026-01-05"),
            make_cycle("2026-03-30", "2026-04-03"),
        ];
        let pred = predict(&cycles).unwrap();
        assert_eq!(pred.predicted_start, date("2026-04-27"));
        assert_eq!(pred.confidence, 0.3);
    }

    #[test]
    fn predicts_steady_cycles() {
        let cycles = vec![
            make_cycle("2026-01-01", "2026-01-05"),
            make_cycle("2026-01-29", "2026-02-02"),
            make_cycle("2026-02-26", "2026-03-02"),
        ];
        let pred = predict(&cycles).unwrap();
        assert_eq!(pred.predicted_start, date("2026-03-26"));
        assert_eq!(pred.range_start, date("2026-03-24"));
        assert_eq!(pred.range_end, date("2026-03-28"));
        // 0.6 * 1.0 + 0.4 * 2/6
        assert_eq!(pred.confidence, 0.73);
        // 5-day periods
        assert_eq!(pred.predicted_end, date("2026-03-30"));
    }

    #[test]
    fn recent_cycles_weigh_more() {
        // gaps 25, 35, 35: plain mean 31.7, weighted (25 + 70 + 105) / 6 = 33.3
        let pred = predict_from_gaps(&[25, 35, 35], date("2026-03-01"), 5.0);
        assert_eq!(pred.predicted_start, date("2026-04-03"));
    }

    #[test]
    fn margin_follows_deviation() {
        // std = 10, margin = 10, consistency = 0
        let pred = predict_from_gaps(&[20, 40], date("2026-03-01"), 5.0);
        assert_eq!(pred.range_end - pred.predicted_start, Duration::days(10));
        assert_eq!(pred.confidence, round_to(0.4 * 2.0 / 6.0, 2));
    }

    #[test]
    fn confidence_saturates_with_six_steady_cycles() {
        let pred = predict_from_gaps(&[28; 8], date("2026-03-01"), 5.0);
        assert_eq!(pred.confidence, 1.0);
    }
}
