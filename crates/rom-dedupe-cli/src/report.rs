use colored::*;
use rom_dedupe_core::{DryRunReport, RankPolicy, ReportGroup, RomEntry};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// How much of a report to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Totals only.
    Summary,
    /// Totals plus one KEEP/REMOVE block per group.
    Groups,
    /// Groups plus every entry's parsed tags and score.
    Debug,
}

pub fn format_report(report: &DryRunReport, detail: Detail, policy: &RankPolicy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Dry Run Report ===".bold());
    let _ = writeln!(out, "Total files: {}", report.total_files);
    let _ = writeln!(
        out,
        "Duplicate groups: {}",
        report.duplicate_groups.to_string().red()
    );
    let _ = writeln!(
        out,
        "Files to remove: {}",
        report.total_to_remove.to_string().red()
    );
    let _ = writeln!(
        out,
        "Reclaimable: {}",
        format_bytes(report.reclaimable_bytes).green()
    );
    if detail == Detail::Summary {
        return out;
    }

    out.push('\n');
    for group in &report.groups {
        format_group(&mut out, group, detail, policy);
    }
    out
}

fn format_group(out: &mut String, group: &ReportGroup, detail: Detail, policy: &RankPolicy) {
    let _ = writeln!(
        out,
        "[{}] {}",
        group.console.cyan(),
        group.display_title.bold()
    );
    let keeper = group
        .keeper
        .as_ref()
        .map(RomEntry::file_name)
        .unwrap_or_else(|| "?".to_string());
    let _ = writeln!(out, "  {} {}", "KEEP:".green(), keeper);
    for entry in &group.planned {
        let _ = writeln!(out, "  {} {}", "REMOVE:".red(), entry.file_name());
    }
    if group.uncertain {
        let _ = writeln!(
            out,
            "  {}",
            "(uncertain - manual review recommended)".yellow()
        );
    }
    if detail == Detail::Debug {
        for entry in &group.entries {
            let meta = entry.parse(policy.parser());
            let key = policy.score(entry);
            let _ = writeln!(
                out,
                "    {} region={} langs={} disc={} quality={} version={} translated={} score=({}, {}, {}, {}, {})",
                entry.file_name().dimmed(),
                meta.region.as_deref().unwrap_or("-"),
                meta.languages
                    .as_ref()
                    .map(|l| l.join(","))
                    .unwrap_or_else(|| "-".to_string()),
                meta.disc_number
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                meta.quality
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                meta.version.as_deref().unwrap_or("-"),
                meta.has_translation,
                key.region,
                key.format,
                key.quality,
                key.version,
                key.size,
            );
        }
    }
    out.push('\n');
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    console: &'a str,
    title: &'a str,
    action: &'static str,
    path: String,
    uncertain: bool,
}

/// One row per keep/remove decision, paths relative to `root`.
pub fn write_csv(report: &DryRunReport, root: &Path, filename: &Path) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_path(filename)?;
    for group in &report.groups {
        let keeper = group.keeper.iter().map(|entry| ("keep", entry));
        let removals = group.planned.iter().map(|entry| ("remove", entry));
        for (action, entry) in keeper.chain(removals) {
            wtr.serialize(CsvRow {
                console: &group.console,
                title: &group.display_title,
                action,
                path: display_relative(root, &entry.path),
                uncertain: group.uncertain,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

pub fn format_bytes(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size_f = size as f64;
    let mut unit_index = 0;
    while size_f >= 1024.0 && unit_index < UNITS.len() - 1 {
        size_f /= 1024.0;
        unit_index += 1;
    }
    if unit_index == 0 {
        format!("{} {}", size, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size_f, UNITS[unit_index])
    }
}
