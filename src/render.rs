//! Plain-text rendering of the dashboard view, plus formatting shared with the TUI

use crate::dashboard::{DashboardView, ReadyView, ServiceRow};
use crate::status::ComponentStatus;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use std::time::Duration;

pub const BRAND: &str = "Atlas";
pub const LOADING_MESSAGE: &str = "Loading status data...";
pub const EMPTY_SEARCH_MESSAGE: &str = "No services match your search.";
pub const NO_INCIDENTS_MESSAGE: &str = "No active incidents";

pub fn format_local_datetime(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub fn status_label(status: Option<ComponentStatus>) -> &'static str {
    status.map(|s| s.label()).unwrap_or("-")
}

/// One glyph per recorded status, oldest first.
pub fn history_dots(history: &[ComponentStatus]) -> String {
    history
        .iter()
        .map(|s| match s {
            ComponentStatus::Operational => '●',
            ComponentStatus::UnderMaintenance => '◆',
            ComponentStatus::DegradedPerformance => '◐',
            ComponentStatus::PartialOutage => '◑',
            ComponentStatus::MajorOutage => '○',
        })
        .collect()
}

pub fn page_label(view: &ReadyView) -> String {
    format!(
        "Page {} of {}",
        view.pagination.page, view.pagination.total_pages
    )
}

pub fn refresh_label(view: &ReadyView, poll_interval: Duration) -> String {
    format!(
        "Auto-refresh every {}s • Last update {}",
        poll_interval.as_secs(),
        format_local_time(&view.updated_at)
    )
}

/// Per-status counts; services with an unrecognised status are only listed when present.
pub fn summary_label(view: &ReadyView) -> String {
    let mut parts: Vec<String> = ComponentStatus::ALL
        .iter()
        .map(|s| format!("{} {}", s.short_label(), view.counts.get(*s)))
        .collect();
    if view.counts.unknown > 0 {
        parts.push(format!("Unknown {}", view.counts.unknown));
    }
    parts.join("  ")
}

pub fn expanded_lines(row: &ServiceRow) -> Vec<String> {
    vec![
        format!("Region: {}", row.service.region),
        format!("Latency: {}", row.service.latency_display()),
        format!("Uptime: {}", row.service.uptime_display()),
        format!(
            "Stability: {} ({})",
            row.stability.as_str(),
            row.change_summary
        ),
    ]
}

/// Render the whole view as text, as printed by `--once`.
pub fn render_text(view: &DashboardView, poll_interval: Duration) -> String {
    match view {
        DashboardView::Loading => format!("{}\n", LOADING_MESSAGE),
        DashboardView::Error(message) => format!("{}\n", message),
        DashboardView::Ready(ready) => render_ready(ready, poll_interval),
    }
}

fn render_ready(view: &ReadyView, poll_interval: Duration) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BRAND);
    let _ = writeln!(out, "{}", view.overall);
    let _ = writeln!(out, "Last updated: {}", format_local_datetime(&view.updated_at));
    if let Some(err) = &view.stale_error {
        let _ = writeln!(out, "! {}", err);
    }
    out.push('\n');

    if !view.query.is_empty() {
        let _ = writeln!(out, "Search: {}", view.query);
    }
    let _ = writeln!(out, "{}", summary_label(view));
    out.push('\n');

    if view.rows.is_empty() {
        let _ = writeln!(out, "{}", EMPTY_SEARCH_MESSAGE);
    } else {
        let name_width = view
            .rows
            .iter()
            .map(|r| r.service.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Service".len());

        let _ = writeln!(
            out,
            "{:<name_width$}  {:<16}  {:<24}  {:>10}  {}",
            "Service", "Status", "Region", "Latency", "Uptime"
        );
        for row in &view.rows {
            let status = format!(
                "{} {}",
                status_label(row.service.status),
                history_dots(&row.history)
            );
            let _ = writeln!(
                out,
                "{:<name_width$}  {:<16}  {:<24}  {:>10}  {}",
                row.service.name,
                status.trim_end(),
                row.service.region,
                row.service.latency_display(),
                row.service.uptime_display()
            );
            if row.expanded {
                for line in expanded_lines(row) {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }
    }

    out.push('\n');
    let _ = writeln!(out, "{}", page_label(view));
    let _ = writeln!(out, "{}", refresh_label(view, poll_interval));
    out.push('\n');

    let _ = writeln!(out, "Incidents");
    if view.incidents.is_empty() {
        let _ = writeln!(out, "{}", NO_INCIDENTS_MESSAGE);
    }
    for incident in &view.incidents {
        let _ = writeln!(
            out,
            "- {} [{}] {}",
            incident.name,
            incident.status,
            format_local_datetime(&incident.updated_at)
        );
    }

    out
}
