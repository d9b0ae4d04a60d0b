use serde_json::Value;
use tracing::{debug, warn};

use crate::source::{RawStatus, StatusSource};
use crate::types::{ScanStatus, ToolDetail, ToolKind, ToolResult};

/// Upstream key names carried by one tool's status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFields {
    pub scanned: &'static str,
    pub found: &'static str,
    pub detail: &'static str,
}

const STRIX_FIELDS: SourceFields = SourceFields {
    scanned: "endpoints_scanned",
    found: "endpoints_found",
    detail: "discovered_endpoints",
};

const NIKTO_FIELDS: SourceFields = SourceFields {
    scanned: "items_scanned",
    found: "vulns_found",
    detail: "vulnerabilities",
};

const NMAP_FIELDS: SourceFields = SourceFields {
    scanned: "ports_scanned",
    found: "open_ports",
    detail: "open_ports_list",
};

impl SourceFields {
    pub fn for_kind(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Strix => STRIX_FIELDS,
            ToolKind::Nikto => NIKTO_FIELDS,
            ToolKind::Nmap => NMAP_FIELDS,
        }
    }
}

/// Where a normalized result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    /// A record existed and was used (possibly with per-field defaults).
    Reported,
    /// Nothing was reported; the result is the zero value.
    Absent,
    /// A record existed but could not be interpreted; the result is the zero value.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub result: ToolResult,
    pub origin: RecordOrigin,
}

/// Reads and normalizes one tool's status for one target. Never fails: absent or
/// malformed records yield the pending zero value, flagged through `origin`.
pub fn normalize(source: &dyn StatusSource, target: &str, kind: ToolKind) -> Normalized {
    match source.read(target, kind) {
        Ok(Some(raw)) => Normalized {
            result: from_raw(kind, &raw),
            origin: RecordOrigin::Reported,
        },
        Ok(None) => {
            debug!(target_name = target, tool = %kind, "no status record");
            Normalized {
                result: ToolResult::pending(kind),
                origin: RecordOrigin::Absent,
            }
        }
        Err(e) => {
            warn!(target_name = target, tool = %kind, error = %e, "ignoring malformed status record");
            Normalized {
                result: ToolResult::pending(kind),
                origin: RecordOrigin::Malformed,
            }
        }
    }
}

/// Maps a raw record onto a `ToolResult`, defaulting each missing or mistyped field
/// on its own.
pub fn from_raw(kind: ToolKind, raw: &RawStatus) -> ToolResult {
    let fields = SourceFields::for_kind(kind);
    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(ScanStatus::parse_lenient)
        .unwrap_or_default();
    let progress = raw.get("progress").map(percent).unwrap_or(0);
    let scanned = raw.get(fields.scanned).map(count).unwrap_or(0);
    let found = raw.get(fields.found).map(count).unwrap_or(0);
    let items = raw.get(fields.detail).and_then(Value::as_array);
    let detail = match kind {
        ToolKind::Strix => ToolDetail::Endpoints(strings(items)),
        ToolKind::Nikto => ToolDetail::Vulns(strings(items)),
        ToolKind::Nmap => ToolDetail::Ports(ports(items)),
    };
    ToolResult {
        status,
        progress,
        scanned,
        found,
        detail,
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn percent(v: &Value) -> u8 {
    number(v).map(|n| n.clamp(0.0, 100.0) as u8).unwrap_or(0)
}

fn count(v: &Value) -> u64 {
    match v {
        Value::Number(n) if n.is_u64() => n.as_u64().unwrap_or(0),
        other => number(other).map(|n| n.max(0.0) as u64).unwrap_or(0),
    }
}

fn strings(items: Option<&Vec<Value>>) -> Vec<String> {
    items
        .into_iter()
        .flatten()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn ports(items: Option<&Vec<Value>>) -> Vec<u16> {
    items
        .into_iter()
        .flatten()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryStatusSource;
    use serde_json::json;

    #[test]
    fn strix_record_maps_its_own_keys() {
        let src = MemoryStatusSource::new().with(
            "www.tripadvisor.com",
            ToolKind::Strix,
            json!({
                "status": "scanning",
                "progress": 50,
                "endpoints_scanned": 2100,
                "endpoints_found": 5,
                "discovered_endpoints": ["/api/", "/hotels"]
            }),
        );
        let n = normalize(&src, "www.tripadvisor.com", ToolKind::Strix);
        assert_eq!(n.origin, RecordOrigin::Reported);
        assert_eq!(n.result.status, ScanStatus::Scanning);
        assert_eq!(n.result.progress, 50);
        assert_eq!(n.result.scanned, 2100);
        assert_eq!(n.result.found, 5);
        assert_eq!(
            n.result.detail,
            ToolDetail::Endpoints(vec!["/api/".into(), "/hotels".into()])
        );
    }

    #[test]
    fn nmap_record_keeps_only_valid_ports() {
        let raw = json!({
            "status": "done",
            "progress": 100,
            "ports_scanned": 1000,
            "open_ports": 3,
            "open_ports_list": [80, "443", 70000, null, -1]
        });
        let r = from_raw(ToolKind::Nmap, raw.as_object().unwrap());
        assert_eq!(r.status, ScanStatus::Completed);
        assert_eq!(r.found, 3);
        assert_eq!(r.detail, ToolDetail::Ports(vec![80, 443]));
    }

    #[test]
    fn partial_record_defaults_per_field() {
        let raw = json!({"progress": 140.7, "items_scanned": "12", "vulns_found": "many"});
        let r = from_raw(ToolKind::Nikto, raw.as_object().unwrap());
        assert_eq!(r.status, ScanStatus::Pending);
        assert_eq!(r.progress, 100);
        assert_eq!(r.scanned, 12);
        assert_eq!(r.found, 0);
        assert_eq!(r.detail, ToolDetail::Vulns(vec![]));
    }

    #[test]
    fn keys_of_other_kinds_are_ignored() {
        let raw = json!({"endpoints_scanned": 9, "items_scanned": 4});
        let r = from_raw(ToolKind::Nikto, raw.as_object().unwrap());
        assert_eq!(r.scanned, 4);
    }

    #[test]
    fn absent_and_malformed_default_but_are_flagged() {
        let mut src = MemoryStatusSource::new();
        src.insert("h", ToolKind::Nikto, "{broken");
        let absent = normalize(&src, "h", ToolKind::Strix);
        let malformed = normalize(&src, "h", ToolKind::Nikto);
        assert_eq!(absent.origin, RecordOrigin::Absent);
        assert_eq!(malformed.origin, RecordOrigin::Malformed);
        assert_eq!(absent.result, ToolResult::pending(ToolKind::Strix));
        assert_eq!(malformed.result, ToolResult::pending(ToolKind::Nikto));
    }
}
