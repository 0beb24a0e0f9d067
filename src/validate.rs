//! Boundary checks. The engine itself assumes sorted, validated input.

use crate::models::{CycleRecord, Profile, SymptomRecord};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid cycle record: {0}")]
    InvalidRecord(String),
    #[error("input out of range: {0}")]
    OutOfRange(String),
}

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;

/// Records must be strictly ascending by start date, with sane end dates and
/// cached lengths.
pub fn validate_cycles(records: &[CycleRecord]) -> Result<(), ValidationError> {
    for record in records {
        validate_cycle(record)?;
    }

    for pair in records.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start_date == prev.start_date {
            return Err(ValidationError::InvalidRecord(format!(
                "duplicate start date {}",
                next.start_date
            )));
        }
        if next.start_date < prev.start_date {
            return Err(ValidationError::InvalidRecord(format!(
                "{} is logged after {}",
                next.start_date, prev.start_date
            )));
        }
    }

    Ok(())
}

pub fn validate_cycle(record: &CycleRecord) -> Result<(), ValidationError> {
    if let Some(end) = record.end_date {
        if end < record.start_date {
            return Err(ValidationError::InvalidRecord(format!(
                "end date {end} precedes start date {}",
                record.start_date
            )));
        }
    }
    if let Some(days) = record.cycle_length.filter(|&d| d <= 0) {
        return Err(ValidationError::InvalidRecord(format!(
            "cycle length {days} on {} is not positive",
            record.start_date
        )));
    }
    if let Some(days) = record.period_length.filter(|&d| d <= 0) {
        return Err(ValidationError::InvalidRecord(format!(
            "period length {days} on {} is not positive",
            record.start_date
        )));
    }
    Ok(())
}

pub fn validate_symptom(symptom: &SymptomRecord) -> Result<(), ValidationError> {
    if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&symptom.severity) {
        return Err(ValidationError::OutOfRange(format!(
            "severity {} for {} outside {MIN_SEVERITY}-{MAX_SEVERITY}",
            symptom.severity, symptom.symptom_type
        )));
    }
    Ok(())
}

pub fn validate_profile(profile: &Profile) -> Result<(), ValidationError> {
    for (field, value) in [("weight_kg", profile.weight_kg), ("height_cm", profile.height_cm)] {
        if let Some(value) = value.filter(|v| v.is_nan() || *v <= 0.0) {
            return Err(ValidationError::OutOfRange(format!(
                "{field} must be positive, got {value}"
            )));
        }
    }
    Ok(())
}
