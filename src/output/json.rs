use crate::model::RunReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name of the consolidated report inside the output directory.
pub const REPORT_FILE_NAME: &str = "license-diff-report.json";

pub fn print_json(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

/// Writes `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Path of the per-project report for `project_name` in `output_dir`.
pub fn project_report_path(output_dir: &Path, project_name: &str) -> PathBuf {
    let safe: String = project_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    output_dir.join(format!("{}-license-diff.json", safe))
}
