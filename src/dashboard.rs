//! Dashboard state and the derived view the renderers draw
//!
//! `DashboardState` is the single owner of everything the screen depends on:
//! the latest snapshot, the last error, the search query, the current page,
//! the selected and expanded rows and the rolling status history. Renderers
//! never look at it directly; they get a `DashboardView` computed from it.

use crate::errors::LOAD_FAILED_MESSAGE;
use crate::history::{Stability, StatusHistory, change_summary};
use crate::pipeline::{Pagination, StatusCounts, count_by_status, filter_services};
use crate::poller::PollEvent;
use crate::status::{ComponentStatus, Incident, Service, Snapshot};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DashboardState {
    snapshot: Option<Snapshot>,
    error: Option<String>,
    query: String,
    page: usize,
    pending_page: Option<usize>,
    page_size: usize,
    selected: usize,
    expanded: Option<String>,
    history: StatusHistory,
}

impl DashboardState {
    pub fn new(page_size: usize, history_depth: usize) -> Self {
        Self {
            snapshot: None,
            error: None,
            query: String::new(),
            page: 1,
            pending_page: None,
            page_size: page_size.max(1),
            selected: 0,
            expanded: None,
            history: StatusHistory::new(history_depth),
        }
    }

    pub fn apply(&mut self, event: PollEvent) {
        match event {
            PollEvent::Loaded(snapshot) => self.apply_snapshot(snapshot),
            PollEvent::Failed(_) => self.apply_failure(),
        }
    }

    /// Replace the snapshot wholesale and clear any earlier failure.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        info!(
            "Applying snapshot updated at {} ({} services)",
            snapshot.updated_at,
            snapshot.services.len()
        );

        self.history.record(&snapshot);
        if let Some(id) = &self.expanded {
            if !snapshot.services.iter().any(|s| &s.id == id) {
                self.expanded = None;
            }
        }

        self.snapshot = Some(snapshot);
        if let Some(page) = self.pending_page.take() {
            self.page = page;
        }
        self.error = None;
        self.clamp();
    }

    /// Record a failed poll. The last good snapshot, if any, stays on screen.
    pub fn apply_failure(&mut self) {
        self.error = Some(LOAD_FAILED_MESSAGE.to_string());
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.reset_position();
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
        self.reset_position();
    }

    pub fn pop_query_char(&mut self) {
        if self.query.pop().is_some() {
            self.reset_position();
        }
    }

    /// Jump to a page; out-of-range values are clamped.
    /// Jump to `page`. Before the first snapshot the request is held and
    /// applied, clamped, once data arrives.
    pub fn set_page(&mut self, page: usize) {
        if self.snapshot.is_none() {
            self.pending_page = Some(page);
            return;
        }
        self.page = page;
        self.selected = 0;
        self.clamp();
    }

    pub fn next_page(&mut self) {
        if self.pagination().has_next() {
            self.page += 1;
            self.selected = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.pagination().has_prev() {
            self.page -= 1;
            self.selected = 0;
        }
    }

    pub fn select_next(&mut self) {
        let rows = self.pagination().range().len();
        if self.selected + 1 < rows {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Expand the selected row, or collapse it if it is already open.
    pub fn toggle_expanded(&mut self) {
        let Some(id) = self.selected_service().map(|s| s.id.clone()) else {
            return;
        };

        if self.expanded.as_deref() == Some(id.as_str()) {
            self.expanded = None;
        } else {
            debug!("Expanding service {}", id);
            self.expanded = Some(id);
        }
    }

    fn selected_service(&self) -> Option<&Service> {
        let filtered = self.filtered();
        let range = self.pagination().range();
        filtered.get(range.start + self.selected).copied()
    }

    fn filtered(&self) -> Vec<&Service> {
        match &self.snapshot {
            Some(snapshot) => filter_services(&snapshot.services, &self.query),
            None => Vec::new(),
        }
    }

    fn pagination(&self) -> Pagination {
        Pagination::new(self.filtered().len(), self.page_size, self.page)
    }

    fn reset_position(&mut self) {
        self.page = 1;
        self.pending_page = None;
        self.selected = 0;
    }

    fn clamp(&mut self) {
        let pagination = self.pagination();
        self.page = pagination.page;
        let rows = pagination.range().len();
        if rows == 0 {
            self.selected = 0;
        } else if self.selected >= rows {
            self.selected = rows - 1;
        }
    }

    /// Compute everything the renderers need.
    pub fn view(&self) -> DashboardView {
        let Some(snapshot) = &self.snapshot else {
            return match &self.error {
                Some(message) => DashboardView::Error(message.clone()),
                None => DashboardView::Loading,
            };
        };

        let filtered = filter_services(&snapshot.services, &self.query);
        let counts = count_by_status(filtered.iter().copied());
        let pagination = Pagination::new(filtered.len(), self.page_size, self.page);

        let rows = filtered[pagination.range()]
            .iter()
            .enumerate()
            .map(|(index, service)| {
                let history = self.history.recent(&service.id);
                ServiceRow {
                    service: (*service).clone(),
                    stability: Stability::classify(&history),
                    change_summary: change_summary(&history),
                    history,
                    selected: index == self.selected,
                    expanded: self.expanded.as_deref() == Some(service.id.as_str()),
                }
            })
            .collect();

        DashboardView::Ready(Box::new(ReadyView {
            overall: snapshot.overall.clone(),
            updated_at: snapshot.updated_at,
            counts,
            query: self.query.clone(),
            rows,
            pagination,
            incidents: snapshot.incidents.clone(),
            stale_error: self.error.clone(),
        }))
    }
}

/// What the screen shows right now.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Loading,
    Error(String),
    Ready(Box<ReadyView>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadyView {
    pub overall: String,
    pub updated_at: DateTime<Utc>,
    pub counts: StatusCounts,
    pub query: String,
    pub rows: Vec<ServiceRow>,
    pub pagination: Pagination,
    pub incidents: Vec<Incident>,
    /// Set when the latest poll failed but an earlier one succeeded.
    pub stale_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRow {
    pub service: Service,
    pub history: Vec<ComponentStatus>,
    pub stability: Stability,
    pub change_summary: String,
    pub selected: bool,
    pub expanded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashboardError;
    use crate::pipeline::parse_region;
    use chrono::TimeZone;

    fn snapshot_with(n: usize, status: ComponentStatus) -> Snapshot {
        Snapshot {
            overall: "All Systems Operational".to_string(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            services: (0..n)
                .map(|i| {
                    let name = if i % 2 == 0 {
                        format!("Edge {} - (E{})", i, i)
                    } else {
                        format!("Core {}", i)
                    };
                    Service {
                        id: format!("svc-{}", i),
                        region: parse_region(&name),
                        name,
                        status: Some(status),
                        latency: None,
                        uptime: None,
                    }
                })
                .collect(),
            incidents: vec![],
        }
    }

    fn ready(view: DashboardView) -> ReadyView {
        match view {
            DashboardView::Ready(view) => *view,
            other => panic!("expected ready view, got {:?}", other),
        }
    }

    #[test]
    fn test_loading_then_error_then_ready() {
        let mut state = DashboardState::new(10, 5);
        assert_eq!(state.view(), DashboardView::Loading);

        state.apply(PollEvent::Failed(DashboardError::Timeout));
        assert_eq!(
            state.view(),
            DashboardView::Error("Failed to load status data".to_string())
        );

        state.apply(PollEvent::Loaded(snapshot_with(3, ComponentStatus::Operational)));
        let view = ready(state.view());
        assert_eq!(view.rows.len(), 3);
        assert!(view.stale_error.is_none());
    }

    #[test]
    fn test_failure_after_success_keeps_snapshot() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(4, ComponentStatus::Operational));
        state.apply_failure();

        let view = ready(state.view());
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.stale_error.as_deref(), Some("Failed to load status data"));
    }

    #[test]
    fn test_snapshot_is_replaced_not_merged() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(6, ComponentStatus::Operational));
        state.apply_snapshot(snapshot_with(2, ComponentStatus::MajorOutage));

        let view = ready(state.view());
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.counts.major_outage, 2);
        assert_eq!(view.counts.operational, 0);
    }

    #[test]
    fn test_paging_and_bounds() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(25, ComponentStatus::Operational));

        state.prev_page();
        assert_eq!(state.page(), 1);

        state.next_page();
        state.next_page();
        state.next_page();
        assert_eq!(state.page(), 3);

        let view = ready(state.view());
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.rows[0].service.id, "svc-20");
        assert!(!view.pagination.has_next());
    }

    #[test]
    fn test_query_edit_resets_page() {
        let mut state = DashboardState::new(5, 5);
        state.apply_snapshot(snapshot_with(20, ComponentStatus::Operational));
        state.next_page();
        assert_eq!(state.page(), 2);

        state.push_query_char('e');
        assert_eq!(state.page(), 1);

        state.set_query("EDGE");
        let view = ready(state.view());
        assert_eq!(view.pagination.total_items, 10);
        assert!(view.rows.iter().all(|r| r.service.name.starts_with("Edge")));

        state.pop_query_char();
        assert_eq!(state.query(), "EDG");
    }

    #[test]
    fn test_shrinking_snapshot_clamps_page() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(30, ComponentStatus::Operational));
        state.set_page(3);
        assert_eq!(state.page(), 3);

        state.apply_snapshot(snapshot_with(12, ComponentStatus::Operational));
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_page_requested_before_first_snapshot() {
        let mut state = DashboardState::new(10, 5);
        state.set_page(3);
        assert_eq!(state.page(), 1);

        state.apply_snapshot(snapshot_with(30, ComponentStatus::Operational));
        assert_eq!(state.page(), 3);
        assert_eq!(ready(state.view()).rows[0].service.id, "svc-20");

        let mut state = DashboardState::new(10, 5);
        state.set_page(3);
        state.apply_snapshot(snapshot_with(12, ComponentStatus::Operational));
        assert_eq!(state.page(), 2);

        state.apply_snapshot(snapshot_with(30, ComponentStatus::Operational));
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_query_edit_drops_requested_page() {
        let mut state = DashboardState::new(10, 5);
        state.set_page(3);
        state.set_query("edge");
        state.apply_snapshot(snapshot_with(30, ComponentStatus::Operational));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_empty_search_result() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(3, ComponentStatus::Operational));
        state.set_query("nothing matches this");

        let view = ready(state.view());
        assert!(view.rows.is_empty());
        assert_eq!(view.pagination.page, 1);
        assert_eq!(view.pagination.total_pages, 1);

        state.toggle_expanded();
        state.select_next();
        assert!(ready(state.view()).rows.is_empty());
    }

    #[test]
    fn test_toggle_expanded_single_row() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(3, ComponentStatus::Operational));

        state.select_next();
        state.toggle_expanded();
        let view = ready(state.view());
        assert!(view.rows[1].expanded);
        assert!(view.rows[1].selected);
        assert!(!view.rows[0].expanded);

        state.select_prev();
        state.toggle_expanded();
        let view = ready(state.view());
        assert!(view.rows[0].expanded);
        assert!(!view.rows[1].expanded);

        state.toggle_expanded();
        assert!(ready(state.view()).rows.iter().all(|r| !r.expanded));
    }

    #[test]
    fn test_selection_stays_within_page() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(2, ComponentStatus::Operational));

        for _ in 0..5 {
            state.select_next();
        }
        let view = ready(state.view());
        assert!(view.rows[1].selected);
    }

    #[test]
    fn test_history_feeds_stability() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(snapshot_with(1, ComponentStatus::Operational));
        state.apply_snapshot(snapshot_with(1, ComponentStatus::PartialOutage));

        let view = ready(state.view());
        let row = &view.rows[0];
        assert_eq!(
            row.history,
            vec![ComponentStatus::Operational, ComponentStatus::PartialOutage]
        );
        assert_eq!(row.stability, Stability::Flapping);
        assert_eq!(row.change_summary, "Status changed 1 time recently");

        state.apply_snapshot(snapshot_with(1, ComponentStatus::MajorOutage));
        assert_eq!(ready(state.view()).rows[0].stability, Stability::Unstable);
    }
}
