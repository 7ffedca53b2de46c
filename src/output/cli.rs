use crate::model::{
    ChangeType, ConsolidatedPackage, Ecosystem, PackageStatus, ProjectResult, RunReport,
    StatusRow,
};
use crate::version::{classify_update, UpdateKind};
use anyhow::Result;
use std::collections::HashMap;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "Ecosystem")]
    ecosystem: String,
    #[tabled(rename = "Package")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Update")]
    update: String,
    #[tabled(rename = "License URL")]
    license_url: String,
}

#[derive(Tabled)]
struct ConsolidatedRow {
    #[tabled(rename = "Ecosystem")]
    ecosystem: String,
    #[tabled(rename = "Package")]
    name: String,
    #[tabled(rename = "License")]
    license: String,
    #[tabled(rename = "Highest")]
    highest: String,
    #[tabled(rename = "Version Change")]
    version_change: String,
    #[tabled(rename = "License Change")]
    license_change: String,
}

pub fn print_cli_table(report: &RunReport) -> Result<()> {
    println!();
    println!(
        "Report generated at: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if report.projects.is_empty() {
        println!();
        println!("No projects were processed.");
        return Ok(());
    }

    for project in &report.projects {
        print_project(project);
    }

    print_consolidated(&report.consolidated.packages);

    println!();
    print_summary(report);

    Ok(())
}

fn print_project(project: &ProjectResult) {
    println!();
    println!(
        "Project {} ({} -> {} dependencies):",
        project.project_name,
        project.from_dependencies.len(),
        project.to_dependencies.len()
    );

    let all = project.status_rows();
    let unchanged = all
        .iter()
        .filter(|r| r.status == PackageStatus::Unchanged)
        .count();
    let rows: Vec<StatusTableRow> = all
        .iter()
        .filter(|r| r.status != PackageStatus::Unchanged)
        .map(status_table_row)
        .collect();

    if rows.is_empty() {
        println!("  No changes ({} unchanged packages).", unchanged);
        return;
    }

    println!();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    if unchanged > 0 {
        println!("  ... and {} unchanged packages", unchanged);
    }
}

fn status_table_row(row: &StatusRow) -> StatusTableRow {
    let update = match row.status {
        PackageStatus::Added | PackageStatus::Removed => "-".to_string(),
        _ => format_update(classify_update(&row.from_version, &row.to_version)),
    };

    StatusTableRow {
        ecosystem: row.ecosystem.display_name().to_string(),
        name: truncate(&row.name, 40),
        status: format_status(row.status),
        from: format_side(&row.from_version, &row.from_license),
        to: format_side(&row.to_version, &row.to_license),
        update,
        license_url: truncate(row.license_url.as_deref().unwrap_or("-"), 50),
    }
}

fn print_consolidated(packages: &[ConsolidatedPackage]) {
    let changed: Vec<&ConsolidatedPackage> = packages
        .iter()
        .filter(|p| p.has_version_change || p.has_license_change)
        .collect();

    if changed.is_empty() {
        return;
    }

    println!();
    println!(
        "Consolidated changes across projects ({} of {} packages):",
        changed.len(),
        packages.len()
    );
    println!();

    let rows: Vec<ConsolidatedRow> = changed
        .iter()
        .map(|p| ConsolidatedRow {
            ecosystem: p.ecosystem.display_name().to_string(),
            name: truncate(&p.name, 40),
            license: truncate(&p.license, 30),
            highest: format_version(&p.highest_version),
            version_change: yes_no(p.has_version_change).to_string(),
            license_change: if p.has_license_change {
                "\x1b[31myes\x1b[0m".to_string()
            } else {
                "no".to_string()
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn format_status(status: PackageStatus) -> String {
    match status {
        PackageStatus::LicenseChanged => format!("\x1b[31m{}\x1b[0m", status),
        PackageStatus::Added => format!("\x1b[32m{}\x1b[0m", status),
        PackageStatus::Removed => format!("\x1b[33m{}\x1b[0m", status),
        _ => status.to_string(),
    }
}

fn format_update(kind: Option<UpdateKind>) -> String {
    match kind {
        Some(UpdateKind::Major) => "\x1b[91mMAJOR\x1b[0m".to_string(),
        Some(kind) => kind.as_str().to_string(),
        None => "-".to_string(),
    }
}

fn format_side(version: &str, license: &str) -> String {
    if version.is_empty() {
        "-".to_string()
    } else {
        format!("{} ({})", version, truncate(license, 25))
    }
}

fn format_version(version: &str) -> String {
    if version.is_empty() {
        "-".to_string()
    } else {
        version.to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn print_summary(report: &RunReport) {
    let count = |change_type: ChangeType| -> usize {
        report.projects.iter().map(|p| p.count(change_type)).sum()
    };

    let mut by_ecosystem: HashMap<Ecosystem, usize> = HashMap::new();
    for dep in report.projects.iter().flat_map(|p| &p.to_dependencies) {
        *by_ecosystem.entry(dep.ecosystem).or_default() += 1;
    }
    let unknown = report
        .projects
        .iter()
        .flat_map(|p| &p.to_dependencies)
        .filter(|d| !d.has_known_license())
        .count();

    println!("Summary:");
    println!("  Projects: {}", report.projects.len());

    let total: usize = by_ecosystem.values().sum();
    if unknown > 0 {
        println!(
            "  Dependencies at target commits: {} ({} with unknown license)",
            total, unknown
        );
    } else {
        println!("  Dependencies at target commits: {}", total);
    }

    if by_ecosystem.len() > 1 {
        let mut parts: Vec<(Ecosystem, usize)> = by_ecosystem.into_iter().collect();
        parts.sort_by_key(|(e, _)| e.as_str());
        let parts: Vec<String> = parts
            .iter()
            .map(|(e, c)| format!("{} {}", c, e.display_name()))
            .collect();
        println!("  By ecosystem: {}", parts.join(", "));
    }

    println!(
        "  Changes: {} added, {} removed, {} license changed",
        count(ChangeType::Added),
        count(ChangeType::Removed),
        count(ChangeType::LicenseChanged)
    );

    if report.has_license_changes() {
        println!();
        println!("\x1b[31mLicense changes detected.\x1b[0m");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("Ünïcödé-package", 8), "Ünïcö...");
    }

    #[test]
    fn test_status_table_row() {
        let row = StatusRow {
            ecosystem: Ecosystem::Nuget,
            name: "Serilog".to_string(),
            status: PackageStatus::VersionChanged,
            from_version: "2.12.0".to_string(),
            from_license: "Apache-2.0".to_string(),
            to_version: "3.1.1".to_string(),
            to_license: "Apache-2.0".to_string(),
            license_url: None,
        };

        let table_row = status_table_row(&row);
        assert_eq!(table_row.ecosystem, "NuGet");
        assert_eq!(table_row.from, "2.12.0 (Apache-2.0)");
        assert!(table_row.update.contains("MAJOR"));
        assert_eq!(table_row.license_url, "-");

        let added = StatusRow {
            status: PackageStatus::Added,
            from_version: String::new(),
            from_license: String::new(),
            ..row
        };
        let table_row = status_table_row(&added);
        assert_eq!(table_row.from, "-");
        assert_eq!(table_row.update, "-");
    }
}
