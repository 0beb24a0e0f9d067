//! Cycle analysis, prediction, fertility estimation and heuristic risk
//! indicators over a subject's logged menstrual cycles.
//!
//! Every engine function is pure: records come in sorted and validated, and
//! the query date is always passed explicitly.

pub mod analysis;
pub mod config;
pub mod fertility;
pub mod history;
pub mod journal;
pub mod models;
pub mod prediction;
pub mod regularity;
pub mod risk;
pub mod stats;
pub mod validate;

pub use analysis::analyze_cycles;
pub use fertility::estimate_fertility;
pub use history::RiskHistory;
pub use journal::{Journal, JournalError};
pub use prediction::predict as predict_next_cycle;
pub use risk::{assess_risks, RiskEngine, ScoreHistory};
pub use validate::ValidationError;
