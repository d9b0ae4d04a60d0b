use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::seed::{SeedList, SeedProject};
use crate::source::DirStatusSource;
use crate::store::write_atomic;
use crate::types::ToolKind;

/// Target that the illustrative records describe.
pub const SIMULATED_TARGET: &str = "www.tripadvisor.com";

/// Writes one illustrative status record per tool plus a one-project seed list, so a
/// collection pass has something to aggregate on a machine without scanners.
pub fn write_simulated_data(source: &DirStatusSource, seed_path: &Path) -> Result<()> {
    source.write(
        SIMULATED_TARGET,
        ToolKind::Strix,
        &json!({
            "status": "scanning",
            "progress": 50,
            "endpoints_scanned": 2100,
            "endpoints_found": 5,
            "discovered_endpoints": ["/api/", "/hotels", "/flights", "/reviews", "/search"]
        }),
    )?;
    source.write(
        SIMULATED_TARGET,
        ToolKind::Nikto,
        &json!({
            "status": "scanning",
            "progress": 40,
            "items_scanned": 45,
            "vulns_found": 2,
            "vulnerabilities": ["X-Frame-Options missing", "Server-Leaks-Information via X-Powered-By"]
        }),
    )?;
    source.write(
        SIMULATED_TARGET,
        ToolKind::Nmap,
        &json!({
            "status": "completed",
            "progress": 100,
            "ports_scanned": 1000,
            "open_ports": 5,
            "open_ports_list": [80, 443, 8080, 8443, 22]
        }),
    )?;

    let seed = SeedList {
        projects: vec![SeedProject {
            name: "Tripadvisor".into(),
            targets: vec![SIMULATED_TARGET.into()],
        }],
    };
    write_atomic(seed_path, &serde_json::to_vec(&seed)?)?;
    info!(dir = %source.dir().display(), seed = %seed_path.display(), "wrote simulated scan data");
    Ok(())
}
