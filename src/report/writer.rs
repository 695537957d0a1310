//! Report persistence.

use super::{ReportError, RewardsReport};
use std::path::{Path, PathBuf};
use tracing::info;

/// `rewards_<wallet>.json`, or `rewards_<wallet>_<start>_-_<end>.json` when `timestamped`.
///
/// Path separators in the window strings are replaced so the name stays a single file.
pub fn report_file_name(report: &RewardsReport, timestamped: bool) -> String {
    let header = &report.header;
    if timestamped {
        format!(
            "rewards_{}_{}_-_{}.json",
            header.wallet_address,
            path_safe(&header.start_date),
            path_safe(&header.end_date)
        )
    } else {
        format!("rewards_{}.json", header.wallet_address)
    }
}

fn path_safe(s: &str) -> String {
    s.replace(['/', '\\'], "-")
}

/// Write `report` as pretty JSON into `dir`, returning the file path.
pub fn write_report(
    report: &RewardsReport,
    dir: &Path,
    timestamped: bool,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(report, timestamped));
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "Wrote rewards report");
    Ok(path)
}
