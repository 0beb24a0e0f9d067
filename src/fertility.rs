//! Ovulation, fertile window and cycle phase.
//!
//! Nothing here is stored: phase and window are re-derived from the latest
//! onset, the average cycle length and the query date on every call.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{
    CalendarDay, CycleRecord, FertilityLevel, FertilityStatus, FertilityWindow, Phase, PhaseInfo,
    PmsWindow,
};
use crate::stats::{cycle_gaps, round_days};

/// Ovulation is assumed this many days before the next onset.
pub const LUTEAL_PHASE_DAYS: f64 = 14.0;

const FERTILE_LEAD_DAYS: i64 = 5;
const FERTILE_TAIL_DAYS: i64 = 1;
const PEAK_LEAD_DAYS: i64 = 2;
const PMS_LEAD_DAYS: i64 = 7;
const CALENDAR_PAST_DAYS: i64 = 7;
const CALENDAR_FUTURE_DAYS: i64 = 35;

/// Estimate ovulation and the fertile window for the cycle that began with
/// `latest`. Suppressed entirely on hormonal birth control, where the
/// ovulatory-cycle assumption does not hold.
pub fn estimate_fertility(
    latest: &CycleRecord,
    avg_length: f64,
    on_birth_control: bool,
) -> Option<FertilityWindow> {
    if on_birth_control {
        tracing::debug!("fertility estimate suppressed on birth control");
        return None;
    }
    Some(window_from_onset(latest.start_date, avg_length))
}

pub fn window_from_onset(onset: NaiveDate, avg_length: f64) -> FertilityWindow {
    let ovulation_offset = round_days(avg_length - LUTEAL_PHASE_DAYS);
    let ovulation_day = onset + Duration::days(ovulation_offset);

    FertilityWindow {
        ovulation_day,
        ovulation_offset,
        fertile_start: ovulation_day - Duration::days(FERTILE_LEAD_DAYS),
        fertile_end: ovulation_day + Duration::days(FERTILE_TAIL_DAYS),
        peak_start: ovulation_day - Duration::days(PEAK_LEAD_DAYS),
        peak_end: ovulation_day,
    }
}

/// 1-indexed day of the cycle that started on `onset`.
pub fn cycle_day(onset: NaiveDate, today: NaiveDate) -> i64 {
    (today - onset).num_days() + 1
}

/// Phase for a 1-indexed cycle day. Days before the onset have no phase.
pub fn phase_for_day(day: i64, avg_length: f64) -> Option<Phase> {
    let phase = match day {
        d if d < 1 => return None,
        1..=5 => Phase::Menstrual,
        6..=13 => Phase::Follicular,
        14..=16 => Phase::Ovulation,
        d if d <= round_days(avg_length) => Phase::Luteal,
        _ => Phase::LateLuteal,
    };
    Some(phase)
}

pub fn current_phase(onset: NaiveDate, avg_length: f64, today: NaiveDate) -> Option<PhaseInfo> {
    let day = cycle_day(onset, today);
    let phase = phase_for_day(day, avg_length)?;

    Some(PhaseInfo {
        phase,
        cycle_day: day,
        description: phase.description().to_string(),
    })
}

pub fn fertility_status(window: &FertilityWindow, today: NaiveDate) -> FertilityStatus {
    if today < window.fertile_start || today > window.fertile_end {
        FertilityStatus::Low
    } else if today == window.ovulation_day {
        FertilityStatus::Peak
    } else if (today - window.ovulation_day).num_days().abs() == 1 {
        FertilityStatus::High
    } else {
        FertilityStatus::Fertile
    }
}

/// Day-by-day fertility levels from a week before `today` to five weeks after.
pub fn fertility_calendar(
    onset: NaiveDate,
    window: &FertilityWindow,
    today: NaiveDate,
) -> Vec<CalendarDay> {
    (-CALENDAR_PAST_DAYS..CALENDAR_FUTURE_DAYS)
        .map(|offset| {
            let date = today + Duration::days(offset);
            let day = cycle_day(onset, date);
            let from_ovulation = (date - window.ovulation_day).num_days();
            let (level, conception_chance) = day_level(day, from_ovulation);

            CalendarDay {
                date,
                cycle_day: (day > 0).then_some(day),
                level,
                conception_chance,
                is_today: date == today,
                is_ovulation: from_ovulation == 0,
                is_period: (1..=5).contains(&day),
            }
        })
        .collect()
}

fn day_level(day: i64, from_ovulation: i64) -> (FertilityLevel, u8) {
    if day <= 0 {
        return (FertilityLevel::None, 0);
    }
    if day <= 5 {
        return (FertilityLevel::Menstrual, 2);
    }
    match from_ovulation {
        d if d < -5 => (FertilityLevel::Low, 5),
        -5 => (FertilityLevel::FertileStart, 10),
        -4 => (FertilityLevel::Fertile, 15),
        -3 => (FertilityLevel::Fertile, 20),
        -2 => (FertilityLevel::High, 25),
        -1 => (FertilityLevel::VeryHigh, 30),
        0 => (FertilityLevel::Peak, 33),
        1 => (FertilityLevel::High, 15),
        _ => (FertilityLevel::Low, 2),
    }
}

/// The week before the predicted onset.
pub fn pms_window(predicted_start: NaiveDate, today: NaiveDate) -> PmsWindow {
    let start = predicted_start - Duration::days(PMS_LEAD_DAYS);
    PmsWindow {
        start,
        end: predicted_start - Duration::days(1),
        is_active: start <= today && today < predicted_start,
    }
}

/// Fertility view for a subject as of `today`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilityOutlook {
    pub window: FertilityWindow,
    pub status: FertilityStatus,
    pub cycle_day: i64,
    pub calendar: Vec<CalendarDay>,
}

/// Build the fertility view from sorted records. `None` without records or on
/// birth control.
pub fn fertility_outlook(
    records: &[CycleRecord],
    on_birth_control: bool,
    today: NaiveDate,
) -> Option<FertilityOutlook> {
    let latest = records.last()?;
    let avg_length = cycle_gaps(records).average_or_default();
    let window = estimate_fertility(latest, avg_length, on_birth_control)?;

    Some(FertilityOutlook {
        status: fertility_status(&window, today),
        cycle_day: cycle_day(latest.start_date, today),
        calendar: fertility_calendar(latest.start_date, &window, today),
        window,
    })
}
