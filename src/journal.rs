//! The subject's logged data, as handed to the engine.
//!
//! A `Journal` owns cycle records, symptoms, daily flow logs, the profile and
//! engine settings. Its mutators keep records sorted by onset and the cached
//! cycle lengths in step with their neighbours.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::analyze_cycles;
use crate::fertility::{fertility_outlook, FertilityOutlook};
use crate::models::{
    period_length_between, CycleAnalysis, CycleRecord, DayLog, EngineSettings, FlowLevel,
    Prediction, Profile, RiskAssessment, SymptomRecord,
};
use crate::prediction;
use crate::risk::{recent_symptoms, RiskEngine, ScoreHistory};
use crate::validate::{
    validate_cycle, validate_cycles, validate_profile, validate_symptom, ValidationError,
};

/// Flow days at most this far apart belong to the same period.
const PERIOD_MERGE_DAYS: i64 = 2;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("no cycle with id {0}")]
    UnknownCycle(Uuid),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Journal {
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub symptoms: Vec<SymptomRecord>,
    #[serde(default)]
    pub day_logs: Vec<DayLog>,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub settings: EngineSettings,
}

impl Journal {
    /// Parse and validate a journal. Cached cycle lengths are recomputed.
    pub fn from_json(json: &str) -> Result<Self, JournalError> {
        let mut journal: Journal = serde_json::from_str(json)?;
        journal.validate()?;
        fill_cycle_lengths(&mut journal.cycles);
        Ok(journal)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_cycles(&self.cycles)?;
        for symptom in &self.symptoms {
            validate_symptom(symptom)?;
        }
        validate_profile(&self.profile)
    }

    /// Insert a record at its chronological position.
    pub fn log_cycle(&mut self, record: CycleRecord) -> Result<(), JournalError> {
        validate_cycle(&record)?;

        match self
            .cycles
            .binary_search_by_key(&record.start_date, |c| c.start_date)
        {
            Ok(_) => Err(ValidationError::InvalidRecord(format!(
                "a cycle already starts on {}",
                record.start_date
            ))
            .into()),
            Err(idx) => {
                self.cycles.insert(idx, record);
                fill_cycle_lengths(&mut self.cycles);
                Ok(())
            }
        }
    }

    pub fn remove_cycle(&mut self, id: Uuid) -> Result<CycleRecord, JournalError> {
        let idx = self.cycle_index(id)?;
        let removed = self.cycles.remove(idx);
        fill_cycle_lengths(&mut self.cycles);
        Ok(removed)
    }

    /// Backfill the last bleeding day of a logged cycle.
    pub fn close_cycle(&mut self, id: Uuid, end_date: NaiveDate) -> Result<(), JournalError> {
        let idx = self.cycle_index(id)?;
        let mut updated = self.cycles[idx].clone();
        updated.end_date = Some(end_date);
        updated.period_length = Some(period_length_between(updated.start_date, end_date));
        validate_cycle(&updated)?;
        self.cycles[idx] = updated;
        Ok(())
    }

    pub fn log_symptom(&mut self, symptom: SymptomRecord) -> Result<(), JournalError> {
        validate_symptom(&symptom)?;
        let idx = self.symptoms.partition_point(|s| s.date <= symptom.date);
        self.symptoms.insert(idx, symptom);
        Ok(())
    }

    /// The cycle a given date falls in. The latest cycle is open-ended.
    pub fn enclosing_cycle(&self, date: NaiveDate) -> Option<&CycleRecord> {
        let idx = self.cycles.partition_point(|c| c.start_date <= date);
        let candidate = self.cycles.get(idx.checked_sub(1)?)?;
        if idx == self.cycles.len() || candidate.contains(date) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Upsert a daily flow entry and merge the cycles derived from the flow
    /// logs into the journal.
    pub fn log_day(&mut self, entry: DayLog, today: NaiveDate) {
        match self.day_logs.iter_mut().find(|l| l.date == entry.date) {
            Some(existing) => {
                existing.flow_level = entry.flow_level;
                existing.notes = entry.notes;
            }
            None => self.day_logs.push(entry),
        }

        self.rebuild_cycles(today);
    }

    /// Merge cycle records derived from the day logs into the journal.
    ///
    /// Derived records replace any record whose span holds a day log or whose
    /// onset falls inside a derived period; records with no day logs behind
    /// them are kept. A derived record whose onset is unchanged keeps its id.
    pub fn rebuild_cycles(&mut self, today: NaiveDate) {
        let mut rebuilt = cycles_from_day_logs(&self.day_logs, today);
        let existing = std::mem::take(&mut self.cycles);

        for record in &mut rebuilt {
            if let Some(previous) = existing.iter().find(|c| c.start_date == record.start_date) {
                record.id = previous.id;
            }
        }

        let kept: Vec<CycleRecord> = existing
            .into_iter()
            .filter(|c| {
                let end = c.end_date.unwrap_or(c.start_date);
                let backed = self
                    .day_logs
                    .iter()
                    .any(|l| (c.start_date..=end).contains(&l.date));
                let covered = rebuilt.iter().any(|r| {
                    let span_end = r.end_date.unwrap_or(today.max(r.start_date));
                    (r.start_date..=span_end).contains(&c.start_date)
                });
                !backed && !covered
            })
            .collect();

        tracing::debug!(
            kept = kept.len(),
            derived = rebuilt.len(),
            "rebuilt cycles from day logs"
        );

        self.cycles = kept;
        self.cycles.extend(rebuilt);
        self.cycles.sort_by_key(|c| c.start_date);
        fill_cycle_lengths(&mut self.cycles);
    }

    pub fn analyze(&self, today: NaiveDate) -> CycleAnalysis {
        analyze_cycles(&self.cycles, today, self.profile.is_on_birth_control)
    }

    pub fn predict(&self) -> Option<Prediction> {
        prediction::predict(&self.cycles)
    }

    pub fn fertility(&self, today: NaiveDate) -> Option<FertilityOutlook> {
        fertility_outlook(&self.cycles, self.profile.is_on_birth_control, today)
    }

    /// Score risks over the symptom look-back window ending at `today`.
    pub fn assess<H: ScoreHistory + ?Sized>(&self, today: NaiveDate, history: &H) -> RiskAssessment {
        let symptoms = recent_symptoms(&self.symptoms, today, self.settings.symptom_window_days);
        RiskEngine::new(self.settings.clone()).assess(
            &self.profile,
            &self.cycles,
            &symptoms,
            history,
        )
    }

    fn cycle_index(&self, id: Uuid) -> Result<usize, JournalError> {
        self.cycles
            .iter()
            .position(|c| c.id == id)
            .ok_or(JournalError::UnknownCycle(id))
    }
}

/// Group flow days into cycle records. A period whose last flow day is within
/// two days of `today` is still running and has no end date.
pub fn cycles_from_day_logs(logs: &[DayLog], today: NaiveDate) -> Vec<CycleRecord> {
    let mut flow_days: Vec<(NaiveDate, FlowLevel)> = logs
        .iter()
        .filter_map(|l| l.flow_level.map(|flow| (l.date, flow)))
        .collect();
    flow_days.sort_by_key(|&(date, _)| date);
    flow_days.dedup_by_key(|&mut (date, _)| date);

    let Some(&(first_day, first_flow)) = flow_days.first() else {
        return Vec::new();
    };

    let mut cycles = Vec::new();
    let (mut start, mut end, mut heaviest) = (first_day, first_day, first_flow);

    for &(day, flow) in &flow_days[1..] {
        if (day - end).num_days() <= PERIOD_MERGE_DAYS {
            end = day;
            heaviest = heaviest.max(flow);
        } else {
            cycles.push(CycleRecord::new(start, Some(end), heaviest));
            (start, end, heaviest) = (day, day, flow);
        }
    }

    let last_end = if (today - end).num_days() <= PERIOD_MERGE_DAYS {
        None
    } else {
        Some(end)
    };
    cycles.push(CycleRecord::new(start, last_end, heaviest));

    fill_cycle_lengths(&mut cycles);
    cycles
}

/// Set each record's cached length to the gap to the next onset.
fn fill_cycle_lengths(cycles: &mut [CycleRecord]) {
    let next_starts: Vec<Option<NaiveDate>> = cycles
        .iter()
        .skip(1)
        .map(|c| Some(c.start_date))
        .chain(std::iter::once(None))
        .collect();

    for (record, next) in cycles.iter_mut().zip(next_starts) {
        record.cycle_length = next.map(|next| (next - record.start_date).num_days());
    }
}
