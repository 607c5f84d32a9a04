//! Rolling per-service status history and the recent-stability heuristic

use crate::status::{ComponentStatus, Snapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Bounded record of status transitions, keyed by service id.
#[derive(Debug, Clone)]
pub struct StatusHistory {
    entries: HashMap<String, VecDeque<ComponentStatus>>,
    depth: usize,
}

impl StatusHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            entries: HashMap::new(),
            depth: depth.max(1),
        }
    }

    /// Fold a fresh snapshot in. A status is appended only when it differs
    /// from the last one recorded for that service; services missing from
    /// the snapshot are forgotten.
    pub fn record(&mut self, snapshot: &Snapshot) {
        let present: HashSet<&str> = snapshot.services.iter().map(|s| s.id.as_str()).collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| present.contains(id.as_str()));
        if self.entries.len() != before {
            debug!(
                "Dropped history for {} services no longer reported",
                before - self.entries.len()
            );
        }

        for service in &snapshot.services {
            let Some(status) = service.status else {
                continue;
            };

            let history = self.entries.entry(service.id.clone()).or_default();
            if history.back() == Some(&status) {
                continue;
            }

            if history.len() >= self.depth {
                history.pop_front();
            }
            history.push_back(status);
        }
    }

    /// Recorded statuses for `id`, oldest first.
    pub fn recent(&self, id: &str) -> Vec<ComponentStatus> {
        self.entries
            .get(id)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stability {
    Stable,
    Flapping,
    Unstable,
}

impl Stability {
    pub fn classify(history: &[ComponentStatus]) -> Self {
        if history.contains(&ComponentStatus::MajorOutage) {
            Stability::Unstable
        } else if history.iter().any(|s| {
            matches!(
                s,
                ComponentStatus::PartialOutage | ComponentStatus::DegradedPerformance
            )
        }) {
            Stability::Flapping
        } else {
            Stability::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::Flapping => "flapping",
            Stability::Unstable => "unstable",
        }
    }
}

/// Number of transitions visible in a history window.
pub fn change_count(history: &[ComponentStatus]) -> usize {
    history.len().saturating_sub(1)
}

pub fn change_summary(history: &[ComponentStatus]) -> String {
    match change_count(history) {
        0 => "No recent status changes".to_string(),
        1 => "Status changed 1 time recently".to_string(),
        n => format!("Status changed {} times recently", n),
    }
}
