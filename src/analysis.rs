use chrono::NaiveDate;

use crate::fertility::{current_phase, estimate_fertility, fertility_status, pms_window};
use crate::models::{
    CycleAnalysis, CycleRecord, CycleStats, PeriodSummary, Regularity, RejectedGap, Sufficiency,
};
use crate::prediction::predict_from_gaps;
use crate::regularity::{self, MAX_NORMAL_CYCLE, MIN_NORMAL_CYCLE};
use crate::stats::{cycle_gaps, period_summary, round_to, DEFAULT_CYCLE_LENGTH};

const RECENT_LENGTHS: usize = 6;

/// Run every cycle unit over records sorted by start date, as of `today`.
pub fn analyze_cycles(
    records: &[CycleRecord],
    today: NaiveDate,
    on_birth_control: bool,
) -> CycleAnalysis {
    let Some(latest) = records.last() else {
        return empty_analysis();
    };

    let series = cycle_gaps(records);
    let stats = series.stats();
    let period = period_summary(records);
    let average = stats
        .as_ref()
        .map(|s| s.mean)
        .unwrap_or(DEFAULT_CYCLE_LENGTH as f64);

    let (sufficiency, regularity) = match &stats {
        Some(stats) => (
            Sufficiency::Sufficient,
            regularity::classify(&series.lengths, stats),
        ),
        None => {
            tracing::debug!(
                gaps = series.lengths.len(),
                "insufficient cycle history, using fallback values"
            );
            (Sufficiency::Insufficient, regularity::insufficient(true))
        }
    };

    let prediction = predict_from_gaps(&series.lengths, latest.start_date, period.average);
    let fertility = estimate_fertility(latest, average, on_birth_control);

    let insights = insights(
        sufficiency,
        stats.as_ref(),
        &regularity,
        &period,
        &series.rejected,
    );
    let skip = series.lengths.len().saturating_sub(RECENT_LENGTHS);

    CycleAnalysis {
        sufficiency,
        average_cycle_length: round_to(average, 1),
        regularity,
        fertility_status: fertility.as_ref().map(|w| fertility_status(w, today)),
        pms: Some(pms_window(prediction.predicted_start, today)),
        prediction: Some(prediction),
        fertility,
        phase: current_phase(latest.start_date, average, today),
        stats,
        period,
        recent_lengths: series.lengths[skip..].to_vec(),
        rejected_gaps: series.rejected,
        insights,
    }
}

fn empty_analysis() -> CycleAnalysis {
    CycleAnalysis {
        sufficiency: Sufficiency::NoData,
        average_cycle_length: DEFAULT_CYCLE_LENGTH as f64,
        stats: None,
        regularity: regularity::insufficient(false),
        prediction: None,
        fertility: None,
        fertility_status: None,
        pms: None,
        phase: None,
        period: period_summary(&[]),
        recent_lengths: Vec::new(),
        rejected_gaps: Vec::new(),
        insights: vec!["Start tracking your cycles to get personalized insights.".to_string()],
    }
}

fn insights(
    sufficiency: Sufficiency,
    stats: Option<&CycleStats>,
    regularity: &Regularity,
    period: &PeriodSummary,
    rejected: &[RejectedGap],
) -> Vec<String> {
    let mut insights = Vec::new();

    match stats {
        Some(stats) => {
            if regularity.is_regular {
                insights.push("Your cycle is regular, a positive sign of hormonal balance.".to_string());
            } else {
                insights.push(
                    "Your cycle shows some variability. Track consistently to identify patterns."
                        .to_string(),
                );
            }

            let avg = stats.mean;
            if avg > MAX_NORMAL_CYCLE as f64 {
                insights.push(
                    "Your cycles tend to be longer than average. Consider discussing this with a healthcare provider."
                        .to_string(),
                );
            } else if avg < MIN_NORMAL_CYCLE as f64 {
                insights.push(
                    "Your cycles are shorter than typical. Consider discussing this with a healthcare provider."
                        .to_string(),
                );
            } else {
                insights.push(format!(
                    "Your average cycle length of {avg:.0} days is within the typical range."
                ));
            }
        }
        None if sufficiency == Sufficiency::Insufficient => {
            insights.push("Track at least 3 cycles for accurate predictions.".to_string());
        }
        None => {}
    }

    if period.average > 7.0 {
        insights.push(
            "Your periods tend to be longer than average. Monitor for heavy bleeding.".to_string(),
        );
    }

    if !rejected.is_empty() {
        insights.push(format!(
            "{} logged cycle gap(s) fell outside 15-60 days and were left out. Check those entries.",
            rejected.len()
        ));
    }

    insights
}
