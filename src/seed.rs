use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::rollup::build_project;
use crate::types::{ProjectId, ScanStatus, Snapshot, Target, ToolDetail, ToolKind, ToolResult};

/// At most this many seed projects are turned into a placeholder snapshot.
pub const SEED_SNAPSHOT_LIMIT: usize = 20;

const SAMPLE_NAMES: &[&str] = &[
    "Tripadvisor",
    "Under Armour",
    "Zendesk",
    "The Fork",
    "Anytask",
    "UltraMobile",
    "Entain",
    "Glean",
    "Sophos",
    "OpenAI",
    "Pinterest",
    "T-Mobile",
    "LastPass",
    "SoundCloud",
    "Linktree",
];

/// The configured list of projects and their targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedList {
    #[serde(default)]
    pub projects: Vec<SeedProject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedProject {
    #[serde(default = "unknown_name")]
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

impl SeedList {
    /// Reads a seed list. `Ok(None)` when the file does not exist.
    pub fn read(path: impl AsRef<Path>) -> Result<Option<SeedList>> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("failed to read seed list: {}", path.display())),
        };
        let seed = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse seed list: {}", path.display()))?;
        Ok(Some(seed))
    }

    /// A seed list with at least one project, or `None`. Read errors are logged, not returned.
    pub fn read_usable(path: impl AsRef<Path>) -> Option<SeedList> {
        match SeedList::read(path) {
            Ok(Some(seed)) if !seed.is_empty() => Some(seed),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "ignoring seed list");
                None
            }
        }
    }

    /// Like `read_usable`, falling back to `default_seed()`.
    pub fn read_or_default(path: impl AsRef<Path>) -> SeedList {
        SeedList::read_usable(path).unwrap_or_else(default_seed)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Seed used by a collection pass when none is configured.
pub fn default_seed() -> SeedList {
    SeedList {
        projects: vec![
            SeedProject {
                name: "Tripadvisor".into(),
                targets: vec!["www.tripadvisor.com".into()],
            },
            SeedProject {
                name: "Example Site".into(),
                targets: vec!["www.example.com".into()],
            },
        ],
    }
}

/// `www.<name>.com` for a bare project name; names that already look like hosts are kept.
pub fn derived_host(name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("www.{}.com", name.to_lowercase().replace(' ', ""))
    }
}

/// Placeholder snapshot for a seed list that has not been collected yet: Strix is
/// marked scanning on every target, the other tools pending.
pub fn seed_snapshot(seed: &SeedList, timestamp: &str) -> Snapshot {
    let projects = seed
        .projects
        .iter()
        .take(SEED_SNAPSHOT_LIMIT)
        .enumerate()
        .map(|(idx, p)| {
            let hosts = if p.targets.is_empty() {
                vec![derived_host(&p.name)]
            } else {
                p.targets.clone()
            };
            let targets = hosts
                .into_iter()
                .map(|h| {
                    Target::from_results(
                        h,
                        [ToolResult {
                            status: ScanStatus::Scanning,
                            ..ToolResult::pending(ToolKind::Strix)
                        }],
                    )
                })
                .collect();
            build_project(Some(ProjectId(idx as u32)), p.name.clone(), targets, None)
        })
        .collect();
    Snapshot::new(projects, timestamp)
}

/// Fixed illustrative board shown when neither a snapshot nor a seed list exists.
pub fn sample_snapshot(timestamp: &str) -> Snapshot {
    let projects = SAMPLE_NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let target = Target::from_results(
                derived_host(name),
                [
                    ToolResult {
                        status: ScanStatus::Scanning,
                        progress: 50,
                        scanned: 1200,
                        found: 3,
                        detail: ToolDetail::Endpoints(vec!["/api/".into(), "/login".into(), "/products".into()]),
                    },
                    ToolResult {
                        status: ScanStatus::Scanning,
                        progress: 40,
                        scanned: 89,
                        found: 1,
                        detail: ToolDetail::Vulns(vec!["Apache negotiation".into()]),
                    },
                    ToolResult::pending(ToolKind::Nmap),
                ],
            );
            build_project(Some(ProjectId(idx as u32)), *name, vec![target], None)
        })
        .collect();
    Snapshot::new(projects, timestamp)
}
