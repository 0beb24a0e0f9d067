use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flow intensity, ordered from lightest to heaviest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowLevel {
    Spotting,
    Light,
    #[default]
    Medium,
    Heavy,
    VeryHeavy,
}

impl FlowLevel {
    pub fn is_heavy(self) -> bool {
        matches!(self, Self::Heavy | Self::VeryHeavy)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    Physical,
    Emotional,
    Hormonal,
    Reproductive,
    Digestive,
    #[default]
    Other,
}

/// Known symptom names per category, in their normalised `snake_case` form.
const CATEGORY_TABLE: &[(SymptomCategory, &[&str])] = &[
    (
        SymptomCategory::Physical,
        &[
            "cramps",
            "headache",
            "back_pain",
            "breast_tenderness",
            "bloating",
            "fatigue",
            "nausea",
            "dizziness",
            "hot_flashes",
            "joint_pain",
            "muscle_aches",
            "pelvic_pain",
        ],
    ),
    (
        SymptomCategory::Emotional,
        &[
            "mood_swings",
            "irritability",
            "anxiety",
            "depression",
            "crying_spells",
            "stress",
            "low_energy",
            "difficulty_concentrating",
        ],
    ),
    (
        SymptomCategory::Hormonal,
        &[
            "acne",
            "oily_skin",
            "hair_loss",
            "excessive_hair_growth",
            "weight_changes",
            "appetite_changes",
            "libido_changes",
        ],
    ),
    (
        SymptomCategory::Reproductive,
        &[
            "heavy_bleeding",
            "light_bleeding",
            "spotting",
            "clots",
            "irregular_periods",
            "painful_periods",
            "vaginal_discharge",
        ],
    ),
    (
        SymptomCategory::Digestive,
        &["constipation", "diarrhea", "gas", "indigestion", "food_cravings"],
    ),
];

impl SymptomCategory {
    /// Look up the category of a free-form symptom name. Unknown names fall
    /// back to `Other`.
    pub fn classify(symptom_type: &str) -> Self {
        let normalised = symptom_type.trim().to_lowercase().replace(' ', "_");
        CATEGORY_TABLE
            .iter()
            .find(|(_, names)| names.contains(&normalised.as_str()))
            .map(|(category, _)| *category)
            .unwrap_or_default()
    }
}

/// One logged cycle, anchored on its onset date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub flow_level: FlowLevel,
    /// Days to the next record's onset. Cached; the journal keeps it current.
    #[serde(default)]
    pub cycle_length: Option<i64>,
    #[serde(default)]
    pub period_length: Option<i64>,
}

impl CycleRecord {
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>, flow_level: FlowLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date,
            flow_level,
            cycle_length: None,
            period_length: end_date.map(|end| period_length_between(start_date, end)),
        }
    }

    /// Whether `date` falls inside `[start_date, start_date + cycle_length)`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.cycle_length {
            Some(length) => {
                let offset = (date - self.start_date).num_days();
                offset >= 0 && offset < length
            }
            None => false,
        }
    }
}

/// Inclusive bleeding days between onset and last flow day.
pub fn period_length_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// A logged symptom. When deserialized without a `category`, the category is
/// classified from the symptom name; an explicit category is kept as given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "SymptomEntry")]
pub struct SymptomRecord {
    pub date: NaiveDate,
    pub symptom_type: String,
    pub category: SymptomCategory,
    pub severity: u8, // 1-10
    pub description: Option<String>,
}

/// Wire form of [`SymptomRecord`] with an optional category.
#[derive(Deserialize)]
struct SymptomEntry {
    date: NaiveDate,
    symptom_type: String,
    #[serde(default)]
    category: Option<SymptomCategory>,
    severity: u8,
    #[serde(default)]
    description: Option<String>,
}

impl From<SymptomEntry> for SymptomRecord {
    fn from(entry: SymptomEntry) -> Self {
        Self {
            category: entry
                .category
                .unwrap_or_else(|| SymptomCategory::classify(&entry.symptom_type)),
            date: entry.date,
            symptom_type: entry.symptom_type,
            severity: entry.severity,
            description: entry.description,
        }
    }
}

impl SymptomRecord {
    /// Build a record, classifying the category from the symptom name.
    pub fn new(date: NaiveDate, symptom_type: impl Into<String>, severity: u8) -> Self {
        let symptom_type = symptom_type.into();
        Self {
            date,
            category: SymptomCategory::classify(&symptom_type),
            symptom_type,
            severity,
            description: None,
        }
    }

    pub fn with_category(mut self, category: SymptomCategory) -> Self {
        self.category = category;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Profile {
    pub age: Option<u32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub is_on_birth_control: bool,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
}

impl Profile {
    /// Body-mass index, when both weight and height are known and positive.
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight_kg?;
        let height_m = self.height_cm? / 100.0;
        if weight <= 0.0 || height_m <= 0.0 {
            return None;
        }
        Some(weight / (height_m * height_m))
    }
}

/// A raw daily flow entry, used to rebuild cycle records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayLog {
    pub date: NaiveDate,
    pub flow_level: Option<FlowLevel>,
    #[serde(default)]
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Engine output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub cycle_count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub shortest: i64,
    pub longest: i64,
}

/// An inter-onset gap dropped by the plausibility filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedGap {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PeriodTrend {
    Increasing,
    Decreasing,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub average: f64,
    pub std_dev: f64,
    pub trend: PeriodTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Regularity {
    pub is_regular: bool,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub confidence: f64,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilityWindow {
    pub ovulation_day: NaiveDate,
    /// 0-based offset of ovulation from the cycle onset.
    pub ovulation_offset: i64,
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub peak_start: NaiveDate,
    pub peak_end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
    LateLuteal,
}

impl Phase {
    pub fn description(self) -> &'static str {
        match self {
            Self::Menstrual => "Menstrual phase: the uterine lining is shedding. Rest is important.",
            Self::Follicular => "Follicular phase: estrogen rises and energy typically increases.",
            Self::Ovulation => "Ovulation phase: peak fertility.",
            Self::Luteal => "Luteal phase: progesterone rises. PMS symptoms may appear towards the end.",
            Self::LateLuteal => "Late luteal phase: the next period may start soon.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseInfo {
    pub phase: Phase,
    pub cycle_day: i64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FertilityStatus {
    Low,
    Fertile,
    High,
    Peak,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FertilityLevel {
    None,
    Menstrual,
    Low,
    FertileStart,
    Fertile,
    High,
    VeryHigh,
    Peak,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub cycle_day: Option<i64>,
    pub level: FertilityLevel,
    /// Rough conception chance in percent.
    pub conception_chance: u8,
    pub is_today: bool,
    pub is_ovulation: bool,
    pub is_period: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmsWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub is_active: bool,
}

/// How much history backed an analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sufficiency {
    NoData,
    Insufficient,
    Sufficient,
}

/// Everything derived from a subject's cycle records for one query date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleAnalysis {
    pub sufficiency: Sufficiency,
    pub average_cycle_length: f64,
    pub stats: Option<CycleStats>,
    pub regularity: Regularity,
    pub prediction: Option<Prediction>,
    pub fertility: Option<FertilityWindow>,
    pub fertility_status: Option<FertilityStatus>,
    pub pms: Option<PmsWindow>,
    pub phase: Option<PhaseInfo>,
    pub period: PeriodSummary,
    /// Up to the six most recent retained cycle lengths.
    pub recent_lengths: Vec<i64>,
    pub rejected_gaps: Vec<RejectedGap>,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Pcos,
    Endometriosis,
    Anemia,
    Thyroid,
}

impl Condition {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pcos => "PCOS",
            Self::Endometriosis => "Endometriosis",
            Self::Anemia => "Anemia",
            Self::Thyroid => "Thyroid",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// One piece of evidence behind a risk score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    pub label: String,
    pub value: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

impl Trend {
    /// Classify the move from `previous` to `current`; changes within
    /// `dead_band` either way are stable. Scores carry two decimals, so the
    /// difference is compared at that precision.
    pub fn between(previous: f64, current: f64, dead_band: f64) -> Self {
        let diff = ((current - previous) * 100.0).round() / 100.0;
        if diff < -dead_band {
            Self::Improving
        } else if diff > dead_band {
            Self::Worsening
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskResult {
    pub condition: Condition,
    pub score: f64,
    pub confidence: f64,
    pub factors: Vec<RiskFactor>,
    pub previous_score: Option<f64>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub results: [RiskResult; 4],
    /// `(1 - mean risk) * 100`.
    pub overall_health_score: f64,
    pub priority_concerns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    /// Score change that still counts as a stable trend. A tunable policy
    /// value, not derived from data.
    #[serde(default = "default_trend_dead_band")]
    pub trend_dead_band: f64,
    #[serde(default = "default_priority_threshold")]
    pub priority_threshold: f64,
    #[serde(default = "default_symptom_window_days")]
    pub symptom_window_days: i64,
}

fn default_trend_dead_band() -> f64 {
    0.1
}

fn default_priority_threshold() -> f64 {
    0.6
}

fn default_symptom_window_days() -> i64 {
    180
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            trend_dead_band: default_trend_dead_band(),
            priority_threshold: default_priority_threshold(),
            symptom_window_days: default_symptom_window_days(),
        }
    }
}
