use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::models::{Condition, RiskAssessment};
use crate::risk::ScoreHistory;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredScore {
    pub score: f64,
    pub confidence: f64,
    pub recorded_on: NaiveDate,
}

/// Past risk scores per condition, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskHistory {
    #[serde(default)]
    pub scores: BTreeMap<Condition, Vec<StoredScore>>,
}

impl RiskHistory {
    /// Append every result of an assessment. A second record on the same day
    /// replaces the first.
    pub fn record(&mut self, assessment: &RiskAssessment, recorded_on: NaiveDate) {
        for result in &assessment.results {
            let entries = self.scores.entry(result.condition).or_default();
            if entries.last().is_some_and(|e| e.recorded_on == recorded_on) {
                entries.pop();
            }
            entries.push(StoredScore {
                score: result.score,
                confidence: result.confidence,
                recorded_on,
            });
        }
    }

    pub fn latest(&self, condition: Condition) -> Option<&StoredScore> {
        self.scores.get(&condition)?.last()
    }

    /// Load a history file. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no risk history yet");
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl ScoreHistory for RiskHistory {
    fn previous_score(&self, condition: Condition) -> Option<f64> {
        self.latest(condition).map(|s| s.score)
    }
}

/// History file under the platform's local data directory.
pub fn default_history_path() -> Result<PathBuf, HistoryError> {
    let dir = config::data_dir().ok_or(HistoryError::NoDataDir)?;
    Ok(dir.join(config::HISTORY_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, SymptomRecord, Trend};
    use crate::risk::RiskEngine;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn acne(n: usize) -> Vec<SymptomRecord> {
        (0..n)
            .map(|_| SymptomRecord::new(date("2026-01-05"), "acne", 5))
            .collect()
    }

    #[test]
    fn record_appends_and_replaces_same_day() {
        let engine = RiskEngine::default();
        let assessment = engine.assess(&Profile::default(), &[], &[], &RiskHistory::default());

        let mut history = RiskHistory::default();
        history.record(&assessment, date("2026-01-01"));
        history.record(&assessment, date("2026-01-01"));
        history.record(&assessment, date("2026-02-01"));

        let pcos = &history.scores[&Condition::Pcos];
        assert_eq!(pcos.len(), 2);
        assert_eq!(history.latest(Condition::Thyroid).unwrap().recorded_on, date("2026-02-01"));
        assert_eq!(history.previous_score(Condition::Anemia), Some(0.1));
    }

    #[test]
    fn history_drives_trend() {
        let engine = RiskEngine::default();
        let profile = Profile::default();

        let mut history = RiskHistory::default();
        let first = engine.assess(&profile, &[], &[], &history);
        history.record(&first, date("2026-01-01"));

        let second = engine.assess(&profile, &[], &acne(3), &history);
        let pcos = &second.results[0];
        assert_eq!(pcos.condition, Condition::Pcos);
        assert_eq!(pcos.previous_score, Some(0.1));
        assert_eq!(pcos.trend, Some(Trend::Worsening));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        assert_eq!(RiskHistory::load(&path).unwrap(), RiskHistory::default());

        let assessment =
            RiskEngine::default().assess(&Profile::default(), &[], &acne(3), &RiskHistory::default());
        let mut history = RiskHistory::default();
        history.record(&assessment, date("2026-03-01"));
        history.save(&path).unwrap();

        let loaded = RiskHistory::load(&path).unwrap();
        assert_eq!(loaded, history);
        assert_eq!(loaded.previous_score(Condition::Pcos), Some(0.6));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, b"{broken").unwrap();
        assert!(matches!(
            RiskHistory::load(&path),
            Err(HistoryError::Serialization(_))
        ));
    }
}
