use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Number of detail entries shown per tool on the board.
pub const DETAIL_PREVIEW_LEN: usize = 5;

/// The three scanner classes run against every target, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    Strix,
    Nikto,
    Nmap,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Strix, ToolKind::Nikto, ToolKind::Nmap];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Strix => "Strix",
            ToolKind::Nikto => "Nikto",
            ToolKind::Nmap => "Nmap",
        }
    }

    /// Lowercase name used in status file names and process matching.
    pub fn slug(self) -> &'static str {
        match self {
            ToolKind::Strix => "strix",
            ToolKind::Nikto => "nikto",
            ToolKind::Nmap => "nmap",
        }
    }

    /// Unit of the `scanned` counter.
    pub fn scanned_unit(self) -> &'static str {
        match self {
            ToolKind::Strix => "URLs",
            ToolKind::Nikto => "items",
            ToolKind::Nmap => "IPs",
        }
    }

    /// Snapshot field holding this kind's detail list.
    pub fn detail_key(self) -> &'static str {
        match self {
            ToolKind::Strix => "endpoints",
            ToolKind::Nikto => "vulns",
            ToolKind::Nmap => "ports",
        }
    }

    /// Board labels for the `found` counter and the detail list.
    pub fn found_label(self) -> &'static str {
        match self {
            ToolKind::Strix => "Endpoints found",
            ToolKind::Nikto => "Issues found",
            ToolKind::Nmap => "Open ports",
        }
    }

    pub fn list_label(self) -> &'static str {
        match self {
            ToolKind::Strix => "Endpoints",
            ToolKind::Nikto => "Issues",
            ToolKind::Nmap => "Ports",
        }
    }

    fn index(self) -> usize {
        match self {
            ToolKind::Strix => 0,
            ToolKind::Nikto => 1,
            ToolKind::Nmap => 2,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|k| k.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tool kind: {s}"))
    }
}

/// Lifecycle state shared by tools and projects.
///
/// Reading is lenient: the legacy synonyms `waiting`, `done` and `running` map onto
/// the canonical three, anything unrecognised reads as `pending`. Writing is always
/// canonical lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ScanStatus {
    #[default]
    Pending,
    Scanning,
    Completed,
}

impl ScanStatus {
    pub const ALL: [ScanStatus; 3] = [ScanStatus::Pending, ScanStatus::Scanning, ScanStatus::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Scanning => "scanning",
            ScanStatus::Completed => "completed",
        }
    }

    /// Human-readable badge text.
    pub fn label(self) -> &'static str {
        match self {
            ScanStatus::Pending => "Pending",
            ScanStatus::Scanning => "Scanning",
            ScanStatus::Completed => "Completed",
        }
    }

    /// Lenient parse used for every upstream status string.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "scanning" | "running" => ScanStatus::Scanning,
            "completed" | "done" => ScanStatus::Completed,
            _ => ScanStatus::Pending,
        }
    }
}

impl From<String> for ScanStatus {
    fn from(s: String) -> Self {
        ScanStatus::parse_lenient(&s)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific findings; the variant fixes which tool produced the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolDetail {
    /// Discovered endpoints (Strix).
    Endpoints(Vec<String>),
    /// Vulnerability descriptions (Nikto).
    Vulns(Vec<String>),
    /// Open ports (Nmap).
    Ports(Vec<u16>),
}

impl ToolDetail {
    pub fn empty(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Strix => ToolDetail::Endpoints(Vec::new()),
            ToolKind::Nikto => ToolDetail::Vulns(Vec::new()),
            ToolKind::Nmap => ToolDetail::Ports(Vec::new()),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolDetail::Endpoints(_) => ToolKind::Strix,
            ToolDetail::Vulns(_) => ToolKind::Nikto,
            ToolDetail::Ports(_) => ToolKind::Nmap,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ToolDetail::Endpoints(v) | ToolDetail::Vulns(v) => v.len(),
            ToolDetail::Ports(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One tool's state against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub status: ScanStatus,
    /// Percentage, 0..=100.
    pub progress: u8,
    pub scanned: u64,
    pub found: u64,
    pub detail: ToolDetail,
}

impl ToolResult {
    /// Zero value used whenever a tool has nothing to report.
    pub fn pending(kind: ToolKind) -> Self {
        Self {
            status: ScanStatus::Pending,
            progress: 0,
            scanned: 0,
            found: 0,
            detail: ToolDetail::empty(kind),
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.detail.kind()
    }
}

/// One endpoint under a project, always carrying exactly one result per tool kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TargetRecord", into = "TargetRecord")]
pub struct Target {
    pub name: String,
    tools: [ToolResult; 3],
}

impl Target {
    /// A target whose tools have not reported anything yet.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: ToolKind::ALL.map(ToolResult::pending),
        }
    }

    /// Builds a target from arbitrary results; the first result per kind wins and
    /// missing kinds default to pending.
    pub fn from_results(name: impl Into<String>, results: impl IntoIterator<Item = ToolResult>) -> Self {
        let mut slots: [Option<ToolResult>; 3] = [None, None, None];
        for r in results {
            let slot = &mut slots[r.kind().index()];
            if slot.is_none() {
                *slot = Some(r);
            }
        }
        let mut slots = slots.into_iter();
        Self {
            name: name.into(),
            tools: ToolKind::ALL.map(|k| slots.next().flatten().unwrap_or_else(|| ToolResult::pending(k))),
        }
    }

    /// Results in fixed `Strix, Nikto, Nmap` order.
    pub fn tools(&self) -> &[ToolResult; 3] {
        &self.tools
    }

    pub fn tool(&self, kind: ToolKind) -> &ToolResult {
        &self.tools[kind.index()]
    }
}

/// Opaque per-snapshot project identifier shared by the summary and detail views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One monitored subject and its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,
    pub name: String,
    #[serde(default)]
    pub status: ScanStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// The complete aggregated tree at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Snapshot {
    pub fn new(projects: Vec<Project>, last_updated: impl Into<String>) -> Self {
        Self {
            projects,
            last_updated: last_updated.into(),
            version: default_version(),
        }
    }

    /// Gives every project a unique id. Existing unique ids are kept; missing or
    /// repeated ones get the next unused number, in project order.
    pub fn assign_missing_ids(&mut self) {
        let mut used = std::collections::HashSet::new();
        let mut needs_id = Vec::new();
        for (idx, p) in self.projects.iter().enumerate() {
            match p.id {
                Some(id) if used.insert(id) => {}
                _ => needs_id.push(idx),
            }
        }
        let mut next = 0u32;
        for idx in needs_id {
            while used.contains(&ProjectId(next)) {
                next += 1;
            }
            used.insert(ProjectId(next));
            self.projects[idx].id = Some(ProjectId(next));
        }
    }
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

/// Wire shape of a target: `{ name, tools: [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TargetRecord {
    name: String,
    #[serde(default)]
    tools: Vec<ToolRecord>,
}

/// Wire shape of a tool result: `{ name, status, progress, scanned, found, endpoints|vulns|ports }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolRecord {
    name: String,
    #[serde(default)]
    status: ScanStatus,
    #[serde(default)]
    progress: u8,
    #[serde(default)]
    scanned: u64,
    #[serde(default)]
    found: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vulns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ports: Option<Vec<u16>>,
}

impl ToolRecord {
    fn into_result(self) -> Option<ToolResult> {
        let kind: ToolKind = self.name.parse().ok()?;
        let detail = match kind {
            ToolKind::Strix => ToolDetail::Endpoints(self.endpoints.unwrap_or_default()),
            ToolKind::Nikto => ToolDetail::Vulns(self.vulns.unwrap_or_default()),
            ToolKind::Nmap => ToolDetail::Ports(self.ports.unwrap_or_default()),
        };
        Some(ToolResult {
            status: self.status,
            progress: self.progress.min(100),
            scanned: self.scanned,
            found: self.found,
            detail,
        })
    }
}

impl From<ToolResult> for ToolRecord {
    fn from(r: ToolResult) -> Self {
        let mut rec = ToolRecord {
            name: r.kind().as_str().to_string(),
            status: r.status,
            progress: r.progress,
            scanned: r.scanned,
            found: r.found,
            endpoints: None,
            vulns: None,
            ports: None,
        };
        match r.detail {
            ToolDetail::Endpoints(v) => rec.endpoints = Some(v),
            ToolDetail::Vulns(v) => rec.vulns = Some(v),
            ToolDetail::Ports(v) => rec.ports = Some(v),
        }
        rec
    }
}

impl From<TargetRecord> for Target {
    fn from(rec: TargetRecord) -> Self {
        Target::from_results(rec.name, rec.tools.into_iter().filter_map(ToolRecord::into_result))
    }
}

impl From<Target> for TargetRecord {
    fn from(t: Target) -> Self {
        TargetRecord {
            name: t.name,
            tools: t.tools.into_iter().map(ToolRecord::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_status_synonyms() {
        assert_eq!(ScanStatus::parse_lenient("done"), ScanStatus::Completed);
        assert_eq!(ScanStatus::parse_lenient("waiting"), ScanStatus::Pending);
        assert_eq!(ScanStatus::parse_lenient("running"), ScanStatus::Scanning);
        assert_eq!(ScanStatus::parse_lenient("Scanning "), ScanStatus::Scanning);
        assert_eq!(ScanStatus::parse_lenient("exploded"), ScanStatus::Pending);
        let s: ScanStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(s, ScanStatus::Completed);
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"completed\"");
    }

    #[test]
    fn target_fills_missing_tools_in_fixed_order() {
        let nmap = ToolResult {
            status: ScanStatus::Completed,
            progress: 100,
            scanned: 1000,
            found: 2,
            detail: ToolDetail::Ports(vec![22, 443]),
        };
        let t = Target::from_results("host", vec![nmap.clone()]);
        let kinds: Vec<_> = t.tools().iter().map(ToolResult::kind).collect();
        assert_eq!(kinds, ToolKind::ALL.to_vec());
        assert_eq!(t.tool(ToolKind::Nmap), &nmap);
        assert_eq!(t.tool(ToolKind::Strix), &ToolResult::pending(ToolKind::Strix));
    }

    #[test]
    fn target_wire_shape_uses_kind_specific_detail_key() {
        let t = Target::pending("www.example.com");
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["tools"][0]["name"], "Strix");
        assert!(v["tools"][0]["endpoints"].is_array());
        assert!(v["tools"][1]["vulns"].is_array());
        assert!(v["tools"][2]["ports"].is_array());
        assert!(v["tools"][0].get("ports").is_none());
    }

    #[test]
    fn target_reads_partial_and_unordered_tools() {
        let raw = r#"{"name":"h","tools":[
            {"name":"Nmap","status":"done","progress":100,"ports":[80]},
            {"name":"Bogus","status":"scanning"},
            {"name":"strix","progress":30}
        ]}"#;
        let t: Target = serde_json::from_str(raw).unwrap();
        assert_eq!(t.tool(ToolKind::Nmap).status, ScanStatus::Completed);
        assert_eq!(t.tool(ToolKind::Nmap).detail, ToolDetail::Ports(vec![80]));
        assert_eq!(t.tool(ToolKind::Strix).progress, 30);
        assert_eq!(t.tool(ToolKind::Nikto), &ToolResult::pending(ToolKind::Nikto));
    }

    #[test]
    fn detail_keys_match_the_wire_fields() {
        let t = Target::from_results(
            "h",
            [
                ToolResult { detail: ToolDetail::Endpoints(vec!["/a".into()]), ..ToolResult::pending(ToolKind::Strix) },
                ToolResult { detail: ToolDetail::Vulns(vec!["v".into()]), ..ToolResult::pending(ToolKind::Nikto) },
                ToolResult { detail: ToolDetail::Ports(vec![22]), ..ToolResult::pending(ToolKind::Nmap) },
            ],
        );
        let wire = serde_json::to_value(&t).unwrap();
        for (tool, kind) in wire["tools"].as_array().unwrap().iter().zip(ToolKind::ALL) {
            assert_eq!(tool["name"], kind.as_str());
            assert_eq!(tool[kind.detail_key()].as_array().unwrap().len(), 1);
        }
    }

    #[test]
    fn assign_missing_ids_keeps_unique_and_fills_rest() {
        let mk = |name: &str, id: Option<u32>| Project {
            id: id.map(ProjectId),
            name: name.into(),
            status: ScanStatus::Pending,
            progress: 0,
            targets: vec![],
            last_updated: None,
        };
        let mut snap = Snapshot::new(
            vec![mk("a", Some(1)), mk("b", None), mk("c", Some(1)), mk("d", Some(0))],
            "t",
        );
        snap.assign_missing_ids();
        let ids: Vec<_> = snap.projects.iter().map(|p| p.id.unwrap().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 0]);
    }
}
