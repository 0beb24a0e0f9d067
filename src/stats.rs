//! Inter-onset gaps and the summary numbers every other unit builds on.

use crate::models::{CycleRecord, CycleStats, PeriodSummary, PeriodTrend, RejectedGap};

/// Gaps outside this range are treated as data-entry errors, not biology.
pub const MIN_PLAUSIBLE_GAP: i64 = 15;
pub const MAX_PLAUSIBLE_GAP: i64 = 60;

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: f64 = 5.0;

/// Retained cycle lengths in chronological order, plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapSeries {
    pub lengths: Vec<i64>,
    pub rejected: Vec<RejectedGap>,
}

impl GapSeries {
    pub fn stats(&self) -> Option<CycleStats> {
        cycle_stats(&self.lengths)
    }

    /// Mean cycle length, or the 28-day default when statistics are undefined.
    pub fn average_or_default(&self) -> f64 {
        self.stats()
            .map(|s| s.mean)
            .unwrap_or(DEFAULT_CYCLE_LENGTH as f64)
    }
}

/// Derive inter-onset gaps from records sorted ascending by start date.
pub fn cycle_gaps(records: &[CycleRecord]) -> GapSeries {
    let mut series = GapSeries::default();

    for pair in records.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let days = (next.start_date - prev.start_date).num_days();

        if (MIN_PLAUSIBLE_GAP..=MAX_PLAUSIBLE_GAP).contains(&days) {
            series.lengths.push(days);
        } else {
            tracing::debug!(
                from = %prev.start_date,
                to = %next.start_date,
                days,
                "dropping implausible cycle gap"
            );
            series.rejected.push(RejectedGap {
                from: prev.start_date,
                to: next.start_date,
                days,
            });
        }
    }

    series
}

/// Summary statistics over retained gaps. Undefined below two gaps.
pub fn cycle_stats(lengths: &[i64]) -> Option<CycleStats> {
    if lengths.len() < 2 {
        return None;
    }

    let values: Vec<f64> = lengths.iter().map(|&l| l as f64).collect();

    Some(CycleStats {
        cycle_count: lengths.len(),
        mean: mean(&values),
        std_dev: std_deviation(&values),
        shortest: lengths.iter().copied().min()?,
        longest: lengths.iter().copied().max()?,
    })
}

/// Bleeding-length summary over the records that carry a period length.
pub fn period_summary(records: &[CycleRecord]) -> PeriodSummary {
    let lengths: Vec<f64> = records
        .iter()
        .filter_map(|r| r.period_length)
        .filter(|&days| days > 0)
        .map(|days| days as f64)
        .collect();

    if lengths.is_empty() {
        return PeriodSummary {
            average: DEFAULT_PERIOD_LENGTH,
            std_dev: 0.0,
            trend: PeriodTrend::Unknown,
        };
    }

    let trend = if lengths.len() >= 3 {
        let (earlier, recent) = lengths.split_at(lengths.len() - 2);
        let (recent, earlier) = (mean(recent), mean(earlier));
        if recent > earlier + 0.5 {
            PeriodTrend::Increasing
        } else if recent < earlier - 0.5 {
            PeriodTrend::Decreasing
        } else {
            PeriodTrend::Stable
        }
    } else {
        PeriodTrend::Unknown
    };

    PeriodSummary {
        average: round_to(mean(&lengths), 1),
        std_dev: round_to(std_deviation(&lengths), 1),
        trend,
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Round a fractional day count to whole days, halves to even.
pub fn round_days(value: f64) -> i64 {
    value.round_ties_even() as i64
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlowLevel;
    use chrono::NaiveDate;

    fn make_cycle(start: &str) -> CycleRecord {
        CycleRecord::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            None,
            FlowLevel::Medium,
        )
    }

    fn with_period(start: &str, days: i64) -> CycleRecord {
        let mut record = make_cycle(start);
        record.period_length = Some(days);
        record
    }

    #[test]
    fn gaps_between_consecutive_onsets() {
        let cycles = vec![
            make_cycle("2026-01-01"),
            make_cycle("2026-01-29"),
            make_cycle("2026-02-26"),
        ];
        let series = cycle_gaps(&cycles);
        assert_eq!(series.lengths, vec![28, 28]);
        assert!(series.rejected.is_empty());
    }

    #[test]
    fn implausible_gaps_are_reported_not_kept() {
        let cycles = vec![
            make_cycle("2026-01-01"),
            make_cycle("2026-01-05"),
            make_cycle("2026-02-02"),
            make_cycle("2026-05-01"),
        ];
        let series = cycle_gaps(&cycles);
        assert_eq!(series.lengths, vec![28]);
        assert_eq!(series.rejected.len(), 2);
        assert_eq!(series.rejected[0].days, 4);
        assert_eq!(series.rejected[1].days, 88);
    }

    #[test]
    fn bounds_of_the_filter_are_inclusive() {
        let cycles = vec![
            make_cycle("2026-01-01"),
            make_cycle("2026-01-16"),
            make_cycle("2026-03-17"),
        ];
        assert_eq!(cycle_gaps(&cycles).lengths, vec![15, 60]);
    }

    #[test]
    fn stats_undefined_below_two_gaps() {
        assert!(cycle_stats(&[]).is_none());
        assert!(cycle_stats(&[28]).is_none());
        let series = GapSeries {
            lengths: vec![30],
            rejected: vec![],
        };
        assert_eq!(series.average_or_default(), 28.0);
    }

    #[test]
    fn stats_use_population_deviation() {
        let stats = cycle_stats(&[40, 45]).unwrap();
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.mean, 42.5);
        assert_eq!(stats.std_dev, 2.5);
        assert_eq!(stats.shortest, 40);
        assert_eq!(stats.longest, 45);
    }

    #[test]
    fn period_summary_defaults_without_data() {
        let summary = period_summary(&[make_cycle("2026-01-01")]);
        assert_eq!(summary.average, 5.0);
        assert_eq!(summary.trend, PeriodTrend::Unknown);
    }

    #[test]
    fn period_summary_detects_lengthening() {
        let cycles = vec![
            with_period("2026-01-01", 4),
            with_period("2026-01-29", 4),
            with_period("2026-02-26", 6),
            with_period("2026-03-26", 7),
        ];
        let summary = period_summary(&cycles);
        assert_eq!(summary.average, 5.3);
        assert_eq!(summary.trend, PeriodTrend::Increasing);
    }

    #[test]
    fn rounding_halves_to_even() {
        assert_eq!(round_days(28.5), 28);
        assert_eq!(round_days(29.5), 30);
        assert_eq!(round_days(14.4), 14);
        assert_eq!(round_to(0.7333, 2), 0.73);
    }
}
