//! Evidence rules per condition.
//!
//! Every weight and threshold used for risk scoring lives in [`RULEBOOK`].
//! Tiers within a rule are ordered strongest first; the first tier whose
//! threshold admits the measured value is the one that contributes.

use crate::models::Impact::{High, Low, Medium};
use crate::models::{Condition, Impact, SymptomCategory, SymptomRecord};
use self::Threshold::{Above, AtLeast};

/// Selects the symptoms a rule looks at.
#[derive(Debug, Clone, Copy)]
pub struct SymptomFilter {
    pub category: Option<SymptomCategory>,
    /// Case-insensitive substrings of the symptom name.
    pub contains: &'static [&'static str],
    /// Case-insensitive exact symptom names.
    pub equals: &'static [&'static str],
}

impl SymptomFilter {
    pub fn matches(&self, symptom: &SymptomRecord) -> bool {
        if self.category.is_some_and(|category| symptom.category != category) {
            return false;
        }
        if self.contains.is_empty() && self.equals.is_empty() {
            return true;
        }
        let name = symptom.symptom_type.to_lowercase();
        self.contains.iter().any(|k| name.contains(k)) || self.equals.iter().any(|k| name == *k)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Signal {
    /// Mean of retained cycle lengths; needs defined cycle statistics.
    MeanCycleLength,
    /// Standard deviation of retained cycle lengths.
    CycleLengthSpread,
    SymptomCount(SymptomFilter),
    /// Mean severity of matching symptoms.
    SymptomSeverity(SymptomFilter),
    HeavyFlowCount,
    /// Heavy-flow cycles over all cycles.
    HeavyFlowShare,
    Bmi,
}

#[derive(Debug, Clone, Copy)]
pub enum Threshold {
    Above(f64),
    AtLeast(f64),
}

impl Threshold {
    pub fn admits(self, value: f64) -> bool {
        match self {
            Self::Above(limit) => value > limit,
            Self::AtLeast(limit) => value >= limit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Tier {
    pub when: Threshold,
    pub evidence: f64,
    pub weight: f64,
    pub impact: Impact,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub signal: Signal,
    pub tiers: &'static [Tier],
}

/// `min(cap, base + data_points / divisor)`.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceModel {
    pub base: f64,
    pub divisor: f64,
    pub cap: f64,
    /// Whether cycle records count as data points alongside symptoms.
    pub counts_cycles: bool,
}

impl ConfidenceModel {
    pub fn estimate(&self, cycles: usize, symptoms: usize) -> f64 {
        let points = symptoms + if self.counts_cycles { cycles } else { 0 };
        (self.base + points as f64 / self.divisor).min(self.cap)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConditionBook {
    pub condition: Condition,
    pub rules: &'static [Rule],
    pub confidence: ConfidenceModel,
}

const fn tier(when: Threshold, evidence: f64, weight: f64, impact: Impact, label: &'static str) -> Tier {
    Tier {
        when,
        evidence,
        weight,
        impact,
        label,
    }
}

const fn keywords(contains: &'static [&'static str]) -> SymptomFilter {
    SymptomFilter {
        category: None,
        contains,
        equals: &[],
    }
}

const fn hormonal(contains: &'static [&'static str]) -> SymptomFilter {
    SymptomFilter {
        category: Some(SymptomCategory::Hormonal),
        contains,
        equals: &[],
    }
}

const PAIN: SymptomFilter = SymptomFilter {
    category: None,
    contains: &["pain"],
    equals: &["cramps"],
};

const EMOTIONAL: SymptomFilter = SymptomFilter {
    category: Some(SymptomCategory::Emotional),
    contains: &[],
    equals: &[],
};

const PCOS_RULES: &[Rule] = &[
    Rule {
        signal: Signal::MeanCycleLength,
        tiers: &[
            tier(Above(35.0), 0.8, 3.0, High, "Long cycle length"),
            tier(Above(32.0), 0.5, 3.0, Medium, "Slightly long cycles"),
            tier(AtLeast(0.0), 0.1, 3.0, Low, "Cycle length within typical range"),
        ],
    },
    Rule {
        signal: Signal::CycleLengthSpread,
        tiers: &[tier(Above(7.0), 0.7, 2.0, High, "Irregular cycle pattern")],
    },
    Rule {
        signal: Signal::SymptomCount(hormonal(&["acne"])),
        tiers: &[tier(AtLeast(3.0), 0.6, 1.5, Medium, "Persistent acne")],
    },
    Rule {
        signal: Signal::SymptomCount(hormonal(&["hair"])),
        tiers: &[tier(AtLeast(2.0), 0.5, 1.5, Medium, "Hair-related symptoms")],
    },
    Rule {
        signal: Signal::SymptomCount(hormonal(&["weight"])),
        tiers: &[tier(AtLeast(2.0), 0.4, 1.0, Low, "Weight changes")],
    },
    Rule {
        signal: Signal::Bmi,
        tiers: &[
            tier(Above(30.0), 0.6, 1.5, Medium, "BMI"),
            tier(Above(25.0), 0.3, 1.0, Low, "Elevated BMI"),
        ],
    },
];

const ENDOMETRIOSIS_RULES: &[Rule] = &[
    // Constant weight across tiers: more severe pain only ever raises evidence.
    Rule {
        signal: Signal::SymptomSeverity(PAIN),
        tiers: &[
            tier(AtLeast(7.0), 0.8, 3.0, High, "Severe pelvic/menstrual pain"),
            tier(AtLeast(5.0), 0.5, 3.0, Medium, "Moderate pelvic pain"),
            tier(AtLeast(1.0), 0.2, 3.0, Low, "Mild pelvic pain"),
        ],
    },
    Rule {
        signal: Signal::SymptomCount(PAIN),
        tiers: &[tier(AtLeast(10.0), 0.7, 2.0, High, "Frequent pain episodes")],
    },
    Rule {
        signal: Signal::HeavyFlowCount,
        tiers: &[tier(AtLeast(2.0), 0.5, 1.5, Medium, "Heavy menstrual bleeding")],
    },
    Rule {
        signal: Signal::SymptomCount(keywords(&["fatigue"])),
        tiers: &[tier(AtLeast(5.0), 0.4, 1.0, Low, "Chronic fatigue")],
    },
];

const ANEMIA_RULES: &[Rule] = &[
    Rule {
        signal: Signal::HeavyFlowShare,
        tiers: &[
            tier(Above(0.5), 0.7, 3.0, High, "Consistently heavy periods"),
            tier(Above(0.25), 0.4, 2.0, Medium, "Occasional heavy periods"),
        ],
    },
    Rule {
        signal: Signal::SymptomSeverity(keywords(&["fatigue", "tired"])),
        tiers: &[
            tier(AtLeast(6.0), 0.6, 2.0, Medium, "Significant fatigue"),
            tier(AtLeast(1.0), 0.2, 2.0, Low, "Mild fatigue"),
        ],
    },
    Rule {
        signal: Signal::SymptomCount(keywords(&["dizz"])),
        tiers: &[tier(AtLeast(2.0), 0.5, 1.5, Medium, "Episodes of dizziness")],
    },
    Rule {
        signal: Signal::SymptomCount(keywords(&["headache"])),
        tiers: &[tier(AtLeast(5.0), 0.3, 1.0, Low, "Frequent headaches")],
    },
];

const THYROID_RULES: &[Rule] = &[
    Rule {
        signal: Signal::SymptomCount(keywords(&["weight"])),
        tiers: &[tier(AtLeast(2.0), 0.5, 2.0, Medium, "Weight fluctuations")],
    },
    Rule {
        signal: Signal::SymptomCount(keywords(&["fatigue"])),
        tiers: &[tier(AtLeast(5.0), 0.4, 1.5, Medium, "Persistent fatigue")],
    },
    Rule {
        signal: Signal::SymptomCount(EMOTIONAL),
        tiers: &[tier(AtLeast(8.0), 0.4, 1.0, Low, "Mood changes")],
    },
    Rule {
        signal: Signal::CycleLengthSpread,
        tiers: &[tier(Above(10.0), 0.5, 1.5, Medium, "Very irregular cycles")],
    },
    Rule {
        signal: Signal::SymptomCount(keywords(&["hair"])),
        tiers: &[tier(AtLeast(1.0), 0.4, 1.0, Low, "Hair changes")],
    },
];

pub static RULEBOOK: [ConditionBook; 4] = [
    ConditionBook {
        condition: Condition::Pcos,
        rules: PCOS_RULES,
        confidence: ConfidenceModel {
            base: 0.3,
            divisor: 50.0,
            cap: 0.9,
            counts_cycles: true,
        },
    },
    ConditionBook {
        condition: Condition::Endometriosis,
        rules: ENDOMETRIOSIS_RULES,
        confidence: ConfidenceModel {
            base: 0.3,
            divisor: 40.0,
            cap: 0.85,
            counts_cycles: false,
        },
    },
    ConditionBook {
        condition: Condition::Anemia,
        rules: ANEMIA_RULES,
        confidence: ConfidenceModel {
            base: 0.3,
            divisor: 40.0,
            cap: 0.85,
            counts_cycles: false,
        },
    },
    ConditionBook {
        condition: Condition::Thyroid,
        rules: THYROID_RULES,
        confidence: ConfidenceModel {
            base: 0.25,
            divisor: 50.0,
            cap: 0.8,
            counts_cycles: false,
        },
    },
];

/// The rulebook entry for a condition, found by its tag rather than its
/// position in the table.
pub fn book_for(condition: Condition) -> Option<&'static ConditionBook> {
    RULEBOOK.iter().find(|book| book.condition == condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn symptom(name: &str) -> SymptomRecord {
        SymptomRecord::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), name, 5)
    }

    #[test]
    fn every_condition_has_one_book() {
        for condition in [
            Condition::Pcos,
            Condition::Endometriosis,
            Condition::Anemia,
            Condition::Thyroid,
        ] {
            assert_eq!(RULEBOOK.iter().filter(|b| b.condition == condition).count(), 1);
            assert_eq!(book_for(condition).unwrap().condition, condition);
        }
    }

    #[test]
    fn tiers_are_ordered_and_bounded() {
        for book in &RULEBOOK {
            assert!(book.confidence.cap < 1.0);
            for rule in book.rules {
                assert!(!rule.tiers.is_empty());
                for pair in rule.tiers.windows(2) {
                    assert!(pair[0].evidence > pair[1].evidence);
                }
                for tier in rule.tiers {
                    assert!(tier.evidence > 0.0 && tier.evidence < 0.95);
                    assert!(tier.weight > 0.0);
                }
            }
        }
    }

    #[test]
    fn severity_rules_keep_a_single_weight() {
        for book in &RULEBOOK {
            for rule in book.rules {
                if let Signal::SymptomSeverity(_) = rule.signal {
                    let weight = rule.tiers[0].weight;
                    assert!(rule.tiers.iter().all(|t| t.weight == weight));
                }
            }
        }
    }

    #[test]
    fn pain_filter_matches_keywords_and_cramps() {
        assert!(PAIN.matches(&symptom("pelvic_pain")));
        assert!(PAIN.matches(&symptom("Back Pain")));
        assert!(PAIN.matches(&symptom("cramps")));
        assert!(!PAIN.matches(&symptom("cramps_mild")));
        assert!(!PAIN.matches(&symptom("headache")));
    }

    #[test]
    fn category_filters_require_the_category() {
        let acne = hormonal(&["acne"]);
        assert!(acne.matches(&symptom("acne")));
        let physical_acne = symptom("acne").with_category(SymptomCategory::Physical);
        assert!(!acne.matches(&physical_acne));
        assert!(EMOTIONAL.matches(&symptom("anxiety")));
        assert!(!EMOTIONAL.matches(&symptom("bloating")));
    }

    #[test]
    fn confidence_is_capped() {
        let model = book_for(Condition::Thyroid).unwrap().confidence;
        assert_eq!(model.estimate(100, 0), 0.25);
        assert_eq!(model.estimate(0, 1000), 0.8);
        let pcos = book_for(Condition::Pcos).unwrap().confidence;
        assert!((pcos.estimate(10, 5) - 0.6).abs() < 1e-9);
    }
}
