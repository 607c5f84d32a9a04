//! Pure transformations from a fetched summary to what the table shows

use crate::status::{ComponentStatus, Incident, Service, Snapshot, SummaryDocument};
use serde::Serialize;
use tracing::debug;

pub const GLOBAL_REGION: &str = "Global";

/// Region embedded in a component name, e.g. `"Paris, France - (CDG)"` → `"Paris, France"`.
pub fn parse_region(name: &str) -> String {
    match name.split_once('-') {
        Some((head, _)) if !head.trim().is_empty() => head.trim().to_string(),
        _ => GLOBAL_REGION.to_string(),
    }
}

/// Build a snapshot from the decoded summary document.
pub fn normalize(doc: SummaryDocument) -> Snapshot {
    let services: Vec<Service> = doc
        .components
        .into_iter()
        .map(|component| {
            let status = ComponentStatus::parse(&component.status);
            if status.is_none() {
                debug!(
                    "Component {} reported unrecognised status {:?}",
                    component.id, component.status
                );
            }

            Service {
                region: parse_region(&component.name),
                id: component.id,
                name: component.name,
                status,
                latency: component.latency,
                uptime: component.uptime,
            }
        })
        .collect();

    let incidents = doc
        .incidents
        .into_iter()
        .map(|incident| Incident {
            id: incident.id,
            name: incident.name,
            status: incident.status,
            updated_at: incident.updated_at,
        })
        .collect();

    Snapshot {
        overall: doc.status.description,
        updated_at: doc.page.updated_at,
        services,
        incidents,
    }
}

/// Case-insensitive substring match on service name, order preserved.
pub fn filter_services<'a>(services: &'a [Service], query: &str) -> Vec<&'a Service> {
    let needle = query.to_lowercase();
    services
        .iter()
        .filter(|service| service.name.to_lowercase().contains(&needle))
        .collect()
}

/// Page position after clamping. Pages are 1-based and there is always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(total_items: usize, page_size: usize, requested_page: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        Self {
            page: requested_page.clamp(1, total_pages),
            total_pages,
            total_items,
            page_size,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Index range of the current page within the filtered list.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }
}

/// Slice out the requested page.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> (&[T], Pagination) {
    let pagination = Pagination::new(items.len(), page_size, page);
    (&items[pagination.range()], pagination)
}

/// Per-status tallies for the summary bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub operational: usize,
    pub degraded_performance: usize,
    pub under_maintenance: usize,
    pub partial_outage: usize,
    pub major_outage: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn get(&self, status: ComponentStatus) -> usize {
        match status {
            ComponentStatus::Operational => self.operational,
            ComponentStatus::DegradedPerformance => self.degraded_performance,
            ComponentStatus::UnderMaintenance => self.under_maintenance,
            ComponentStatus::PartialOutage => self.partial_outage,
            ComponentStatus::MajorOutage => self.major_outage,
        }
    }
}

pub fn count_by_status<'a, I>(services: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a Service>,
{
    services
        .into_iter()
        .fold(StatusCounts::default(), |mut counts, service| {
            match service.status {
                Some(ComponentStatus::Operational) => counts.operational += 1,
                Some(ComponentStatus::DegradedPerformance) => counts.degraded_performance += 1,
                Some(ComponentStatus::UnderMaintenance) => counts.under_maintenance += 1,
                Some(ComponentStatus::PartialOutage) => counts.partial_outage += 1,
                Some(ComponentStatus::MajorOutage) => counts.major_outage += 1,
                None => counts.unknown += 1,
            }
            counts
        })
}
