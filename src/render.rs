use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use askama::Template;
use serde::Serialize;

use crate::activity::ProcessActivity;
use crate::store::write_atomic;
use crate::types::{ScanStatus, Snapshot, ToolKind, DETAIL_PREVIEW_LEN};
use crate::view::{summarize, PageSize, ProjectSummary, PAGE_WINDOW};

/// Seconds between automatic reloads of the rendered board.
pub const REFRESH_INTERVAL_SECS: u32 = 60;

/// Per-kind display table consumed by the board script.
#[derive(Debug, Serialize)]
struct ToolMeta {
    key: &'static str,
    unit: &'static str,
    found: &'static str,
    list: &'static str,
}

impl ToolMeta {
    fn for_kind(kind: ToolKind) -> Self {
        Self {
            key: kind.detail_key(),
            unit: kind.scanned_unit(),
            found: kind.found_label(),
            list: kind.list_label(),
        }
    }
}

struct ToolCount {
    name: &'static str,
    count: usize,
}

#[derive(Template)]
#[template(path = "board.html")]
struct BoardTemplate<'a> {
    generated_at: &'a str,
    project_count: usize,
    active_total: usize,
    tool_counts: Vec<ToolCount>,
    refresh_secs: u32,
    page_sizes: Vec<usize>,
    default_page_size: usize,
    page_window: u32,
    preview_len: usize,
    status_labels_json: String,
    tool_meta_json: String,
    summaries_json: String,
    snapshot_json: String,
}

/// A rendered, self-contained status board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub html: String,
    pub project_count: usize,
    pub summaries: Vec<ProjectSummary>,
}

impl Document {
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, self.html.as_bytes())
            .with_context(|| format!("failed to write board: {}", path.display()))
    }
}

/// Renders the board. Output depends only on the inputs; `generated_at` is shown
/// verbatim in the header.
pub fn render(snapshot: &Snapshot, activity: ProcessActivity, generated_at: &str) -> Result<Document> {
    let mut snapshot = snapshot.clone();
    snapshot.assign_missing_ids();
    let summaries = summarize(&snapshot);

    let page = BoardTemplate {
        generated_at,
        project_count: snapshot.projects.len(),
        active_total: activity.total(),
        tool_counts: ToolKind::ALL
            .into_iter()
            .map(|kind| ToolCount {
                name: kind.as_str(),
                count: activity.get(kind),
            })
            .collect(),
        refresh_secs: REFRESH_INTERVAL_SECS,
        page_sizes: PageSize::ALL.iter().map(|s| s.get()).collect(),
        default_page_size: PageSize::default().get(),
        page_window: PAGE_WINDOW,
        preview_len: DETAIL_PREVIEW_LEN,
        status_labels_json: script_json(&status_labels())?,
        tool_meta_json: script_json(&tool_meta())?,
        summaries_json: script_json(&summaries)?,
        snapshot_json: script_json(&snapshot)?,
    };
    let html = page.render().context("failed to render board template")?;
    Ok(Document {
        html,
        project_count: snapshot.projects.len(),
        summaries,
    })
}

fn status_labels() -> BTreeMap<&'static str, &'static str> {
    ScanStatus::ALL.into_iter().map(|s| (s.as_str(), s.label())).collect()
}

fn tool_meta() -> BTreeMap<&'static str, ToolMeta> {
    ToolKind::ALL
        .into_iter()
        .map(|kind| (kind.as_str(), ToolMeta::for_kind(kind)))
        .collect()
}

/// JSON that is safe to place inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}
