use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "cykel-insights";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HISTORY_FILE: &str = "risk-history.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", APP_NAME.replace('-', "_"))
}

/// Local data directory for stored risk history, e.g.
/// `~/.local/share/cykel` on Linux.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("cykel"))
}
