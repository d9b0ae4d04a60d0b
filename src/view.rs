//! Board state machine: filter, search, pagination and drill-down over the
//! project summaries. The client script embedded by `render` performs the same
//! transitions in the browser; this module is the reference behaviour.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{Project, ProjectId, ScanStatus, Snapshot};

/// Page numbers shown on each side of the current page.
pub const PAGE_WINDOW: u32 = 2;

/// Compact per-project entry used for list rendering and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub status: ScanStatus,
    pub status_label: &'static str,
    pub progress: u8,
    pub target_count: usize,
}

impl ProjectSummary {
    pub fn new(id: ProjectId, project: &Project) -> Self {
        Self {
            id,
            name: project.name.clone(),
            status: project.status,
            status_label: project.status.label(),
            progress: project.progress,
            target_count: project.targets.len(),
        }
    }
}

/// Summaries in snapshot order. Projects without an id fall back to their position.
pub fn summarize(snapshot: &Snapshot) -> Vec<ProjectSummary> {
    snapshot
        .projects
        .iter()
        .enumerate()
        .map(|(idx, p)| ProjectSummary::new(p.id.unwrap_or(ProjectId(idx as u32)), p))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Scanning,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(self, status: ScanStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Scanning => status == ScanStatus::Scanning,
            StatusFilter::Completed => status == ScanStatus::Completed,
            StatusFilter::Pending => status == ScanStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Eight, PageSize::Sixteen, PageSize::ThirtyTwo];

    pub fn get(self) -> usize {
        match self {
            PageSize::Eight => 8,
            PageSize::Sixteen => 16,
            PageSize::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = usize;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        PageSize::ALL.into_iter().find(|s| s.get() == n).ok_or(n)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetailLookupError {
    #[error("no project summary with id {0}")]
    UnknownSummary(ProjectId),
    #[error("no detail record for project {name:?} (id {id})")]
    MissingDetail { id: ProjectId, name: String },
}

/// Client-side board state. Every transition is followed by a full `derive_view`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub filter: StatusFilter,
    pub search: String,
    pub current_page: u32,
    pub page_size: PageSize,
    pub open_detail: Option<ProjectId>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            filter: StatusFilter::All,
            search: String::new(),
            current_page: 1,
            page_size: PageSize::Eight,
            open_detail: None,
        }
    }
}

impl BoardState {
    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.current_page = 1;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.current_page = 1;
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.current_page = 1;
    }

    /// Out-of-range pages are allowed and render as an empty slice.
    pub fn go_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    /// Resolves a summary id to its full project. On failure the state is unchanged.
    pub fn open_detail<'a>(
        &mut self,
        id: ProjectId,
        summaries: &[ProjectSummary],
        snapshot: &'a Snapshot,
    ) -> Result<&'a Project, DetailLookupError> {
        let summary = summaries
            .iter()
            .find(|s| s.id == id)
            .ok_or(DetailLookupError::UnknownSummary(id))
            .inspect_err(|e| debug!(error = %e, "detail lookup failed"))?;
        let project = snapshot
            .projects
            .iter()
            .enumerate()
            .find(|(idx, p)| p.id.unwrap_or(ProjectId(*idx as u32)) == id)
            .map(|(_, p)| p)
            .ok_or_else(|| DetailLookupError::MissingDetail {
                id,
                name: summary.name.clone(),
            })
            .inspect_err(|e| debug!(error = %e, "detail lookup failed"))?;
        self.open_detail = Some(id);
        Ok(project)
    }

    pub fn close_detail(&mut self) {
        self.open_detail = None;
    }

    fn matches(&self, summary: &ProjectSummary) -> bool {
        self.filter.matches(summary.status)
            && summary.name.to_lowercase().contains(&self.search.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControlKind {
    First,
    Prev,
    Number,
    Next,
    Last,
}

/// One button of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControl {
    pub kind: PageControlKind,
    pub page: u32,
    pub disabled: bool,
    pub active: bool,
}

/// Everything the board shows for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView<'a> {
    pub items: Vec<&'a ProjectSummary>,
    pub matched: usize,
    pub page_count: u32,
    pub controls: Vec<PageControl>,
}

impl BoardView<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Filters (status AND search), then slices the requested page.
pub fn derive_view<'a>(state: &BoardState, summaries: &'a [ProjectSummary]) -> BoardView<'a> {
    let filtered: Vec<&ProjectSummary> = summaries.iter().filter(|s| state.matches(s)).collect();
    let matched = filtered.len();
    let size = state.page_size.get();
    let page_count = matched.div_ceil(size) as u32;
    let start = (state.current_page.max(1) as usize - 1).saturating_mul(size);
    let items: Vec<&ProjectSummary> = filtered.into_iter().skip(start).take(size).collect();
    let controls = if items.is_empty() {
        Vec::new()
    } else {
        page_controls(state.current_page, page_count)
    };
    BoardView {
        items,
        matched,
        page_count,
        controls,
    }
}

/// First/prev, up to five numbers centred on `current`, next/last. Empty for a
/// single page.
pub fn page_controls(current: u32, page_count: u32) -> Vec<PageControl> {
    if page_count <= 1 {
        return Vec::new();
    }
    let at_start = current == 1;
    let at_end = current == page_count;
    let edge = |kind, page, disabled| PageControl {
        kind,
        page,
        disabled,
        active: false,
    };
    let mut controls = vec![
        edge(PageControlKind::First, 1, at_start),
        edge(PageControlKind::Prev, current.saturating_sub(1), at_start),
    ];
    let lo = current.saturating_sub(PAGE_WINDOW).max(1);
    let hi = current.saturating_add(PAGE_WINDOW).min(page_count);
    controls.extend((lo..=hi).map(|n| PageControl {
        kind: PageControlKind::Number,
        page: n,
        disabled: false,
        active: n == current,
    }));
    controls.push(edge(PageControlKind::Next, current + 1, at_end));
    controls.push(edge(PageControlKind::Last, page_count, at_end));
    controls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries(n: u32) -> Vec<ProjectSummary> {
        (0..n)
            .map(|i| {
                let status = if i % 2 == 0 { ScanStatus::Scanning } else { ScanStatus::Completed };
                ProjectSummary {
                    id: ProjectId(i),
                    name: format!("P{i}"),
                    status,
                    status_label: status.label(),
                    progress: 0,
                    target_count: 1,
                }
            })
            .collect()
    }

    fn names(view: &BoardView<'_>) -> Vec<String> {
        view.items.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn initial_state() {
        let s = BoardState::default();
        assert_eq!(s.filter, StatusFilter::All);
        assert_eq!(s.search, "");
        assert_eq!(s.current_page, 1);
        assert_eq!(s.page_size.get(), 8);
        assert_eq!(s.open_detail, None);
    }

    #[test]
    fn transitions_reset_to_first_page() {
        let mut s = BoardState::default();
        s.go_page(3);
        s.set_filter(StatusFilter::Pending);
        assert_eq!(s.current_page, 1);
        s.go_page(3);
        s.set_search("acme");
        assert_eq!(s.current_page, 1);
        s.go_page(3);
        s.set_page_size(PageSize::ThirtyTwo);
        assert_eq!(s.current_page, 1);
        s.go_page(0);
        assert_eq!(s.current_page, 1);
    }

    #[test]
    fn filter_and_search_combine() {
        let mut all = summaries(12);
        all[10].name = "Acme Corp".into();
        let mut s = BoardState::default();
        s.set_search("ACME");
        assert_eq!(names(&derive_view(&s, &all)), vec!["Acme Corp"]);
        s.set_filter(StatusFilter::Completed);
        assert!(derive_view(&s, &all).is_empty());
        s.set_search("p1");
        assert_eq!(names(&derive_view(&s, &all)), vec!["P1", "P11"]);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let all = summaries(3);
        let mut s = BoardState::default();
        s.go_page(7);
        let v = derive_view(&s, &all);
        assert!(v.is_empty());
        assert_eq!(v.page_count, 1);
        assert!(v.controls.is_empty());
    }

    #[test]
    fn page_controls_window_and_disabling() {
        let c = page_controls(1, 10);
        assert!(c[0].disabled && c[1].disabled);
        let numbers: Vec<u32> = c.iter().filter(|b| b.kind == PageControlKind::Number).map(|b| b.page).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(!c[c.len() - 1].disabled);

        let c = page_controls(5, 10);
        let numbers: Vec<u32> = c.iter().filter(|b| b.kind == PageControlKind::Number).map(|b| b.page).collect();
        assert_eq!(numbers, vec![3, 4, 5, 6, 7]);
        assert!(c.iter().any(|b| b.active && b.page == 5));

        let c = page_controls(10, 10);
        let next = c.iter().find(|b| b.kind == PageControlKind::Next).unwrap();
        assert!(next.disabled);
        assert!(!c[1].disabled);
        assert!(page_controls(1, 1).is_empty());
    }

    #[test]
    fn page_size_only_accepts_known_sizes() {
        assert_eq!(PageSize::try_from(16), Ok(PageSize::Sixteen));
        assert_eq!(PageSize::try_from(10), Err(10));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_detail_lookups_are_logged() {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let summaries = summaries(2);
        let empty = Snapshot::new(vec![], "t");
        let mut state = BoardState::default();
        tracing::subscriber::with_default(subscriber, || {
            assert!(state.open_detail(ProjectId(9), &summaries, &empty).is_err());
            assert!(state.open_detail(ProjectId(1), &summaries, &empty).is_err());
        });
        assert_eq!(state, BoardState::default());

        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("no project summary with id 9"), "{out}");
        assert!(out.contains("no detail record for project \"P1\" (id 1)"), "{out}");
    }
}
