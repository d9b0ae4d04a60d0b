use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_SNAPSHOT_PATH: &str = "/tmp/vuln_dashboard_data.json";
pub const DEFAULT_SEED_PATH: &str = "/tmp/vuln_targets.json";
pub const DEFAULT_STATUS_DIR: &str = "/tmp/vuln_scans";
pub const DEFAULT_OUTPUT_PATH: &str = "/tmp/vuln_scan_dashboard.html";

/// Where the pipeline reads and writes. Every path can come from a flag or the environment.
#[derive(Debug, Clone, Args)]
pub struct BoardPaths {
    /// Aggregated snapshot (JSON), written by `collect` and read by `render`.
    #[arg(long, global = true, env = "SCANBOARD_SNAPSHOT", default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot: PathBuf,

    /// Seed target list: {"projects": [{"name": ..., "targets": [...]}]}.
    #[arg(long, global = true, env = "SCANBOARD_SEED", default_value = DEFAULT_SEED_PATH)]
    pub seed: PathBuf,

    /// Directory holding one `<target>_<tool>.json` status record per scan.
    #[arg(long = "status-dir", global = true, env = "SCANBOARD_STATUS_DIR", default_value = DEFAULT_STATUS_DIR)]
    pub status_dir: PathBuf,

    /// Rendered board (HTML).
    #[arg(long, global = true, env = "SCANBOARD_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,
}
