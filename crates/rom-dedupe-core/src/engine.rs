use crate::config::AppConfig;
use crate::error::Error;
use crate::grouper::{self, GameGroup};
use crate::progress::ProgressReporter;
use crate::ranker::RankPolicy;
use crate::scanner::{self, RomEntry};
use crate::staging::{
    self, ApplyOptions, ApplyOutcome, OnConflict, RestoreOutcome, SystemTrash, TrashBin,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Runs the pipeline for one ROMs root: scan, group, rank, and then apply or restore.
pub struct DedupeEngine {
    root: PathBuf,
    config: AppConfig,
    policy: RankPolicy,
}

/// One game group with its ranking, as shown to the user and consumed by apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGroup {
    pub console: String,
    /// Normalized grouping title.
    pub title: String,
    pub display_title: String,
    /// Every entry of the group in scan order, playlists included.
    pub entries: Vec<RomEntry>,
    pub keeper: Option<RomEntry>,
    /// Ranked removals, playlists excluded.
    pub to_remove: Vec<RomEntry>,
    pub uncertain: bool,
    /// What apply would take off disk for this group: `to_remove` after
    /// playlist and disc-set expansion.
    pub planned: Vec<RomEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct DryRunReport {
    /// Groups with at least one planned removal, in (console, title) order.
    pub groups: Vec<ReportGroup>,
    pub total_files: usize,
    pub duplicate_groups: usize,
    /// Files apply would remove, after playlist and disc-set expansion.
    pub total_to_remove: usize,
    pub reclaimable_bytes: u64,
    pub scan_duration: Duration,
}

impl DedupeEngine {
    pub fn new(root: impl Into<PathBuf>, config: AppConfig) -> Self {
        let policy = RankPolicy::from_config(&config);
        Self {
            root: root.into(),
            config,
            policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn policy(&self) -> &RankPolicy {
        &self.policy
    }

    pub fn scan(&self) -> Result<Vec<RomEntry>, Error> {
        scanner::scan(&self.root, &self.config)
    }

    pub fn groups(&self, entries: &[RomEntry]) -> Vec<GameGroup> {
        grouper::group_entries(entries, self.policy.parser())
    }

    /// Scan, group and rank without touching the filesystem.
    pub fn dry_run(&self) -> Result<DryRunReport, Error> {
        info!("Scanning {}...", self.root.display());
        let scan_start = Instant::now();
        let entries = self.scan()?;
        let mut report = self.build_report(&entries);
        report.scan_duration = scan_start.elapsed();
        debug!(
            "Dry run completed in {:.2}s, {} files, {} duplicate groups",
            report.scan_duration.as_secs_f64(),
            report.total_files,
            report.duplicate_groups,
        );
        Ok(report)
    }

    pub fn build_report(&self, entries: &[RomEntry]) -> DryRunReport {
        let mut report = DryRunReport {
            total_files: entries.len(),
            ..Default::default()
        };

        for group in self.groups(entries) {
            let result = self.policy.rank(&group);
            if result.to_remove.is_empty() {
                continue;
            }
            let mut report_group = ReportGroup {
                console: group.console,
                title: group.title,
                display_title: group.display_title,
                entries: group.entries,
                keeper: result.keeper,
                to_remove: result.to_remove,
                uncertain: result.uncertain,
                planned: Vec::new(),
            };
            report_group.planned = staging::expand_removals(&report_group, self.policy.parser());
            if report_group.planned.is_empty() {
                debug!(
                    console = %report_group.console,
                    title = %report_group.title,
                    "Nothing to remove after protecting the keeper's discs"
                );
                continue;
            }
            report.total_to_remove += report_group.planned.len();
            report.reclaimable_bytes += report_group
                .planned
                .iter()
                .map(RomEntry::size)
                .sum::<u64>();
            report.groups.push(report_group);
        }
        report.duplicate_groups = report.groups.len();
        report
    }

    /// Apply a report, sending hard removals to the system trash.
    pub fn apply(
        &self,
        report: &DryRunReport,
        options: ApplyOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<ApplyOutcome, Error> {
        self.apply_with_trash(report, options, &SystemTrash, reporter)
    }

    pub fn apply_with_trash(
        &self,
        report: &DryRunReport,
        options: ApplyOptions,
        trash: &dyn TrashBin,
        reporter: &dyn ProgressReporter,
    ) -> Result<ApplyOutcome, Error> {
        staging::apply_removal(&self.root, &report.groups, options, trash, reporter)
    }

    pub fn restore(
        &self,
        on_conflict: OnConflict,
        reporter: &dyn ProgressReporter,
    ) -> Result<RestoreOutcome, Error> {
        staging::restore(&self.root, on_conflict, reporter)
    }
}
