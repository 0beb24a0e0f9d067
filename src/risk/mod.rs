//! Heuristic risk indicators for a fixed set of conditions.
//!
//! Scores are bounded indicators with an explanation attached, never a
//! diagnosis. Each condition is scored from its [`rulebook`] entry as a
//! weighted average of the evidence that fired.

pub mod rulebook;

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::models::{
    Condition, CycleRecord, CycleStats, EngineSettings, Profile, RiskAssessment, RiskFactor,
    RiskResult, SymptomRecord, Trend,
};
use crate::stats::{cycle_gaps, mean, round_to};

use self::rulebook::{ConditionBook, Signal, SymptomFilter, RULEBOOK};

/// Score reported when no rule fires.
pub const BASELINE_SCORE: f64 = 0.1;
/// Heuristics never claim more than this.
pub const MAX_SCORE: f64 = 0.95;

const NO_EVIDENCE_CONFIDENCE: f64 = 0.2;

/// Read access to the last stored score per condition.
pub trait ScoreHistory {
    fn previous_score(&self, condition: Condition) -> Option<f64>;
}

/// History for a subject with no stored assessments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl ScoreHistory for NoHistory {
    fn previous_score(&self, _condition: Condition) -> Option<f64> {
        None
    }
}

impl ScoreHistory for HashMap<Condition, f64> {
    fn previous_score(&self, condition: Condition) -> Option<f64> {
        self.get(&condition).copied()
    }
}

impl ScoreHistory for BTreeMap<Condition, f64> {
    fn previous_score(&self, condition: Condition) -> Option<f64> {
        self.get(&condition).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    settings: EngineSettings,
}

impl RiskEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// Score every condition. Trend fields are left empty.
    pub fn score(
        &self,
        profile: &Profile,
        records: &[CycleRecord],
        symptoms: &[SymptomRecord],
    ) -> [RiskResult; 4] {
        let evidence = Evidence::new(profile, records, symptoms);
        RULEBOOK.each_ref().map(|book| score_condition(book, &evidence))
    }

    /// Score every condition and compare against the stored history.
    pub fn assess<H: ScoreHistory + ?Sized>(
        &self,
        profile: &Profile,
        records: &[CycleRecord],
        symptoms: &[SymptomRecord],
        history: &H,
    ) -> RiskAssessment {
        let mut results = self.score(profile, records, symptoms);

        for result in &mut results {
            if let Some(previous) = history.previous_score(result.condition) {
                result.previous_score = Some(previous);
                result.trend = Some(Trend::between(
                    previous,
                    result.score,
                    self.settings.trend_dead_band,
                ));
            }
        }

        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        let overall_health_score = round_to((1.0 - mean(&scores)) * 100.0, 1);

        let priority_concerns = results
            .iter()
            .filter(|r| r.score >= self.settings.priority_threshold)
            .map(|r| {
                format!(
                    "{} risk is elevated ({:.0}%)",
                    r.condition.display_name(),
                    r.score * 100.0
                )
            })
            .collect();

        RiskAssessment {
            results,
            overall_health_score,
            priority_concerns,
        }
    }
}

/// Score every condition with default settings and no history.
pub fn assess_risks(
    profile: &Profile,
    records: &[CycleRecord],
    symptoms: &[SymptomRecord],
) -> [RiskResult; 4] {
    RiskEngine::default().score(profile, records, symptoms)
}

/// Symptoms logged within `window_days` before `today`.
pub fn recent_symptoms(
    symptoms: &[SymptomRecord],
    today: NaiveDate,
    window_days: i64,
) -> Vec<SymptomRecord> {
    let cutoff = today - Duration::days(window_days);
    symptoms
        .iter()
        .filter(|s| s.date >= cutoff)
        .cloned()
        .collect()
}

/// Inputs shared by every rule, measured once per assessment.
struct Evidence<'a> {
    profile: &'a Profile,
    records: &'a [CycleRecord],
    symptoms: &'a [SymptomRecord],
    stats: Option<CycleStats>,
}

struct Measurement {
    value: f64,
    display: String,
}

impl<'a> Evidence<'a> {
    fn new(profile: &'a Profile, records: &'a [CycleRecord], symptoms: &'a [SymptomRecord]) -> Self {
        Self {
            profile,
            records,
            symptoms,
            stats: cycle_gaps(records).stats(),
        }
    }

    fn matching(&self, filter: &SymptomFilter) -> impl Iterator<Item = &'a SymptomRecord> + '_ {
        let filter = *filter;
        self.symptoms.iter().filter(move |s| filter.matches(s))
    }

    fn heavy_cycles(&self) -> usize {
        self.records.iter().filter(|r| r.flow_level.is_heavy()).count()
    }

    fn measure(&self, signal: &Signal) -> Option<Measurement> {
        match signal {
            Signal::MeanCycleLength => self.stats.as_ref().map(|s| Measurement {
                value: s.mean,
                display: format!("{:.1} days avg", s.mean),
            }),
            Signal::CycleLengthSpread => self.stats.as_ref().map(|s| Measurement {
                value: s.std_dev,
                display: format!("±{:.1} days variation", s.std_dev),
            }),
            Signal::SymptomCount(filter) => {
                let count = self.matching(filter).count();
                (count > 0).then(|| Measurement {
                    value: count as f64,
                    display: format!("{count} occurrences"),
                })
            }
            Signal::SymptomSeverity(filter) => {
                let severities: Vec<f64> =
                    self.matching(filter).map(|s| f64::from(s.severity)).collect();
                if severities.is_empty() {
                    return None;
                }
                let average = mean(&severities);
                Some(Measurement {
                    value: average,
                    display: format!("Avg severity: {average:.1}/10"),
                })
            }
            Signal::HeavyFlowCount => {
                let heavy = self.heavy_cycles();
                (heavy > 0).then(|| Measurement {
                    value: heavy as f64,
                    display: format!("{heavy} cycles"),
                })
            }
            Signal::HeavyFlowShare => {
                let heavy = self.heavy_cycles();
                let total = self.records.len();
                (heavy > 0).then(|| Measurement {
                    value: heavy as f64 / total.max(1) as f64,
                    display: format!("{heavy}/{total} cycles"),
                })
            }
            Signal::Bmi => self.profile.bmi().map(|bmi| Measurement {
                value: bmi,
                display: format!("{bmi:.1}"),
            }),
        }
    }
}

fn score_condition(book: &ConditionBook, evidence: &Evidence<'_>) -> RiskResult {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    let mut factors = Vec::new();

    for rule in book.rules {
        let Some(measurement) = evidence.measure(&rule.signal) else {
            continue;
        };
        let Some(tier) = rule.tiers.iter().find(|t| t.when.admits(measurement.value)) else {
            continue;
        };

        weighted += tier.evidence * tier.weight;
        total_weight += tier.weight;
        factors.push(RiskFactor {
            label: tier.label.to_string(),
            value: measurement.display,
            impact: tier.impact,
        });
    }

    let (score, confidence) = if total_weight > 0.0 {
        let score = (weighted / total_weight).clamp(BASELINE_SCORE, MAX_SCORE);
        let confidence = book
            .confidence
            .estimate(evidence.records.len(), evidence.symptoms.len());
        (round_to(score, 2), round_to(confidence, 2))
    } else {
        (BASELINE_SCORE, NO_EVIDENCE_CONFIDENCE)
    };

    tracing::debug!(
        condition = ?book.condition,
        score,
        confidence,
        factors = factors.len(),
        "scored condition"
    );

    RiskResult {
        condition: book.condition,
        score,
        confidence,
        factors,
        previous_score: None,
        trend: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlowLevel, Impact, SymptomCategory};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_cycle(start: &str, flow_level: FlowLevel) -> CycleRecord {
        CycleRecord::new(date(start), None, flow_level)
    }

    fn symptoms(name: &str, count: usize, severity: u8) -> Vec<SymptomRecord> {
        (0..count)
            .map(|i| SymptomRecord::new(date("2026-01-01") + Duration::days(i as i64), name, severity))
            .collect()
    }

    fn result_for(results: &[RiskResult], condition: Condition) -> &RiskResult {
        results.iter().find(|r| r.condition == condition).unwrap()
    }

    #[test]
    fn no_evidence_gives_baseline() {
        let results = assess_risks(&Profile::default(), &[], &[]);
        assert_eq!(results.len(), 4);
        for result in &results {
            assert_eq!(result.score, BASELINE_SCORE);
            assert_eq!(result.confidence, 0.2);
            assert!(result.factors.is_empty());
            assert!(result.trend.is_none());
        }
    }

    #[test]
    fn pcos_combines_bmi_and_hormonal_symptoms() {
        let profile = Profile {
            weight_kg: Some(81.92),
            height_cm: Some(160.0),
            ..Profile::default()
        };
        let acne: Vec<_> = symptoms("acne", 3, 4)
            .into_iter()
            .map(|s| s.with_category(SymptomCategory::Hormonal))
            .collect();

        let results = assess_risks(&profile, &[], &acne);
        let pcos = result_for(&results, Condition::Pcos);

        assert!(pcos.score > BASELINE_SCORE);
        assert_eq!(pcos.score, 0.6);
        assert_eq!(pcos.factors.len(), 2);
        assert_eq!(pcos.factors[0].label, "Persistent acne");
        assert_eq!(pcos.factors[1].label, "BMI");
        assert_eq!(pcos.factors[1].value, "32.0");
        // 0.3 + 3 / 50
        assert_eq!(pcos.confidence, 0.36);
    }

    #[test]
    fn endometriosis_from_severe_frequent_pain() {
        let cramps = symptoms("cramps", 10, 8);
        let results = assess_risks(&Profile::default(), &[], &cramps);
        let endo = result_for(&results, Condition::Endometriosis);

        // (0.8 * 3 + 0.7 * 2) / 5
        assert_eq!(endo.score, 0.76);
        assert_eq!(endo.confidence, 0.55);
        assert_eq!(endo.factors[0].impact, Impact::High);
        assert_eq!(endo.factors[0].value, "Avg severity: 8.0/10");
    }

    #[test]
    fn anemia_from_heavy_flow_share() {
        let cycles = vec![
            make_cycle("2026-01-01", FlowLevel::Heavy),
            make_cycle("2026-01-29", FlowLevel::VeryHeavy),
            make_cycle("2026-02-26", FlowLevel::Heavy),
            make_cycle("2026-03-26", FlowLevel::Light),
        ];
        let results = assess_risks(&Profile::default(), &cycles, &[]);
        let anemia = result_for(&results, Condition::Anemia);
        assert_eq!(anemia.score, 0.7);
        assert_eq!(anemia.factors[0].value, "3/4 cycles");

        // Endometriosis sees the same heavy cycles.
        let endo = result_for(&results, Condition::Endometriosis);
        assert_eq!(endo.score, 0.5);
    }

    #[test]
    fn thyroid_and_pcos_read_cycle_spread() {
        // gaps 20 and 45: mean 32.5, std 12.5
        let cycles = vec![
            make_cycle("2026-01-01", FlowLevel::Medium),
            make_cycle("2026-01-21", FlowLevel::Medium),
            make_cycle("2026-03-07", FlowLevel::Medium),
        ];
        let results = assess_risks(&Profile::default(), &cycles, &[]);

        let thyroid = result_for(&results, Condition::Thyroid);
        assert_eq!(thyroid.score, 0.5);
        assert_eq!(thyroid.factors[0].label, "Very irregular cycles");

        let pcos = result_for(&results, Condition::Pcos);
        // (0.5 * 3 + 0.7 * 2) / 5
        assert_eq!(pcos.score, 0.58);
        assert_eq!(pcos.factors.len(), 2);
    }

    #[test]
    fn missing_profile_fields_skip_bmi() {
        let profile = Profile {
            weight_kg: Some(95.0),
            ..Profile::default()
        };
        let results = assess_risks(&profile, &[], &[]);
        assert_eq!(result_for(&results, Condition::Pcos).score, BASELINE_SCORE);
    }

    #[test]
    fn every_raised_score_is_explained() {
        let mut all = symptoms("pelvic_pain", 4, 6);
        all.extend(symptoms("fatigue", 6, 7));
        all.extend(symptoms("dizziness", 2, 5));
        all.extend(symptoms("hair_loss", 2, 3));
        let profile = Profile {
            weight_kg: Some(70.0),
            height_cm: Some(160.0),
            ..Profile::default()
        };

        for result in assess_risks(&profile, &[], &all) {
            assert!(result.score >= BASELINE_SCORE && result.score <= MAX_SCORE);
            assert!(result.confidence < 1.0);
            if result.score > BASELINE_SCORE {
                assert!(!result.factors.is_empty(), "{:?} has no factors", result.condition);
            }
        }
    }

    #[test]
    fn higher_pain_severity_never_lowers_the_score() {
        let mut previous = 0.0;
        for severity in 1..=10 {
            let mut all = symptoms("pelvic_pain", 3, severity);
            all.extend(symptoms("fatigue", 5, 4));
            let results = assess_risks(&Profile::default(), &[], &all);
            let score = result_for(&results, Condition::Endometriosis).score;
            assert!(score >= previous, "severity {severity}: {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn trend_compares_with_history() {
        let cramps = symptoms("cramps", 10, 8);
        let history: HashMap<Condition, f64> =
            [(Condition::Endometriosis, 0.3), (Condition::Anemia, 0.15)].into();

        let assessment =
            RiskEngine::default().assess(&Profile::default(), &[], &cramps, &history);

        let endo = result_for(&assessment.results, Condition::Endometriosis);
        assert_eq!(endo.previous_score, Some(0.3));
        assert_eq!(endo.trend, Some(Trend::Worsening));

        let anemia = result_for(&assessment.results, Condition::Anemia);
        assert_eq!(anemia.trend, Some(Trend::Stable));

        let pcos = result_for(&assessment.results, Condition::Pcos);
        assert_eq!(pcos.trend, None);
    }

    #[test]
    fn dead_band_is_configurable() {
        let cramps = symptoms("cramps", 10, 8);
        let history: HashMap<Condition, f64> = [(Condition::Endometriosis, 0.6)].into();
        let settings = EngineSettings {
            trend_dead_band: 0.2,
            ..EngineSettings::default()
        };

        let assessment = RiskEngine::new(settings).assess(&Profile::default(), &[], &cramps, &history);
        let endo = result_for(&assessment.results, Condition::Endometriosis);
        assert_eq!(endo.trend, Some(Trend::Stable));
    }

    #[test]
    fn summary_reports_priority_concerns() {
        let cramps = symptoms("cramps", 10, 8);
        let assessment = RiskEngine::default().assess(&Profile::default(), &[], &cramps, &NoHistory);

        // mean of 0.1, 0.76, 0.1, 0.1 = 0.265
        assert_eq!(assessment.overall_health_score, 73.5);
        assert_eq!(
            assessment.priority_concerns,
            vec!["Endometriosis risk is elevated (76%)".to_string()]
        );
    }

    #[test]
    fn scoring_is_idempotent() {
        let mut all = symptoms("cramps", 6, 7);
        all.extend(symptoms("headache", 5, 3));
        let first = assess_risks(&Profile::default(), &[], &all);
        let second = assess_risks(&Profile::default(), &[], &all);
        assert_eq!(first, second);
    }

    #[test]
    fn recent_symptoms_respects_window() {
        let all = vec![
            SymptomRecord::new(date("2025-06-01"), "cramps", 5),
            SymptomRecord::new(date("2026-01-10"), "cramps", 5),
        ];
        let recent = recent_symptoms(&all, date("2026-02-01"), 180);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].date, date("2026-01-10"));
    }
}
