//! Folds tool results into target and project progress/status.

use tracing::info;

use crate::normalize::{normalize, RecordOrigin};
use crate::seed::SeedList;
use crate::source::StatusSource;
use crate::types::{Project, ProjectId, ScanStatus, Snapshot, Target, ToolKind, ToolResult};

/// Counts of where every tool result in a collection pass came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub reported: usize,
    pub absent: usize,
    pub malformed: usize,
}

impl CollectionReport {
    fn record(&mut self, origin: RecordOrigin) {
        match origin {
            RecordOrigin::Reported => self.reported += 1,
            RecordOrigin::Absent => self.absent += 1,
            RecordOrigin::Malformed => self.malformed += 1,
        }
    }
}

/// Floor of the mean of the target's three tool percentages.
pub fn target_progress(target: &Target) -> u8 {
    let sum: u32 = target.tools().iter().map(|t| u32::from(t.progress)).sum();
    (sum / target.tools().len() as u32) as u8
}

/// Floor of the mean of the targets' contributions; 0 with no targets.
pub fn project_progress(targets: &[Target]) -> u8 {
    if targets.is_empty() {
        return 0;
    }
    let sum: u64 = targets.iter().map(|t| u64::from(target_progress(t))).sum();
    (sum / targets.len() as u64) as u8
}

/// `scanning` if any tool scans, else `completed` if every tool completed, else
/// `pending`. A project without targets is `pending`.
pub fn project_status(targets: &[Target]) -> ScanStatus {
    let mut tools = targets.iter().flat_map(|t| t.tools().iter()).peekable();
    if tools.peek().is_none() {
        return ScanStatus::Pending;
    }
    let mut all_completed = true;
    for tool in tools {
        match tool.status {
            ScanStatus::Scanning => return ScanStatus::Scanning,
            ScanStatus::Completed => {}
            ScanStatus::Pending => all_completed = false,
        }
    }
    if all_completed {
        ScanStatus::Completed
    } else {
        ScanStatus::Pending
    }
}

/// Builds a project from already-assembled targets, computing its rollup fields.
pub fn build_project(
    id: Option<ProjectId>,
    name: impl Into<String>,
    targets: Vec<Target>,
    last_updated: Option<String>,
) -> Project {
    Project {
        id,
        name: name.into(),
        status: project_status(&targets),
        progress: project_progress(&targets),
        targets,
        last_updated,
    }
}

/// Reads all three tools for one target.
pub fn aggregate_target(source: &dyn StatusSource, name: &str, report: &mut CollectionReport) -> Target {
    let results: Vec<ToolResult> = ToolKind::ALL
        .into_iter()
        .map(|kind| {
            let n = normalize(source, name, kind);
            report.record(n.origin);
            n.result
        })
        .collect();
    Target::from_results(name, results)
}

/// Aggregates one project. Duplicate target names are read once per occurrence.
pub fn aggregate_project(
    source: &dyn StatusSource,
    id: ProjectId,
    name: &str,
    target_names: &[String],
    timestamp: &str,
    report: &mut CollectionReport,
) -> Project {
    let targets = target_names
        .iter()
        .map(|t| aggregate_target(source, t, report))
        .collect();
    build_project(Some(id), name, targets, Some(timestamp.to_string()))
}

/// One full collection pass over the seed list. Cannot fail.
pub fn collect(source: &dyn StatusSource, seed: &SeedList, timestamp: &str) -> (Snapshot, CollectionReport) {
    let mut report = CollectionReport::default();
    let projects: Vec<Project> = seed
        .projects
        .iter()
        .enumerate()
        .map(|(idx, p)| aggregate_project(source, ProjectId(idx as u32), &p.name, &p.targets, timestamp, &mut report))
        .collect();
    info!(
        projects = projects.len(),
        reported = report.reported,
        absent = report.absent,
        malformed = report.malformed,
        "collection pass finished"
    );
    (Snapshot::new(projects, timestamp), report)
}
