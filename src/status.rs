//! Status data structures: the wire summary document and the snapshot built from it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Operational,
    UnderMaintenance,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
}

impl ComponentStatus {
    pub const ALL: [ComponentStatus; 5] = [
        ComponentStatus::Operational,
        ComponentStatus::DegradedPerformance,
        ComponentStatus::UnderMaintenance,
        ComponentStatus::PartialOutage,
        ComponentStatus::MajorOutage,
    ];

    /// Parse the wire name; unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "operational" => Some(ComponentStatus::Operational),
            "under_maintenance" => Some(ComponentStatus::UnderMaintenance),
            "degraded_performance" => Some(ComponentStatus::DegradedPerformance),
            "partial_outage" => Some(ComponentStatus::PartialOutage),
            "major_outage" => Some(ComponentStatus::MajorOutage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Operational => "operational",
            ComponentStatus::UnderMaintenance => "under_maintenance",
            ComponentStatus::DegradedPerformance => "degraded_performance",
            ComponentStatus::PartialOutage => "partial_outage",
            ComponentStatus::MajorOutage => "major_outage",
        }
    }

    /// Label shown in the services table.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentStatus::Operational => "Operational",
            ComponentStatus::UnderMaintenance => "Maintenance",
            ComponentStatus::DegradedPerformance => "Degraded",
            ComponentStatus::PartialOutage => "Partial Outage",
            ComponentStatus::MajorOutage => "Major Outage",
        }
    }

    /// Shorter label for the summary bar.
    pub fn short_label(&self) -> &'static str {
        match self {
            ComponentStatus::Operational => "Operational",
            ComponentStatus::UnderMaintenance => "Maintenance",
            ComponentStatus::DegradedPerformance => "Degraded",
            ComponentStatus::PartialOutage => "Partial",
            ComponentStatus::MajorOutage => "Outage",
        }
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A monitored component as shown on the dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub region: String,
    pub status: Option<ComponentStatus>,
    pub latency: Option<f64>,
    pub uptime: Option<String>,
}

impl Service {
    /// `"<n> ms"`, or `-` when latency is missing or zero.
    pub fn latency_display(&self) -> String {
        match self.latency {
            Some(ms) if ms != 0.0 => format!("{} ms", ms),
            _ => "-".to_string(),
        }
    }

    pub fn uptime_display(&self) -> &str {
        match self.uptime.as_deref() {
            Some(uptime) if !uptime.is_empty() => uptime,
            _ => "-",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub id: String,
    pub name: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// One successful poll, replaced wholesale on the next one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub overall: String,
    pub updated_at: DateTime<Utc>,
    pub services: Vec<Service>,
    pub incidents: Vec<Incident>,
}

/// Statuspage v2 `summary.json` document, only the fields the dashboard reads.
#[derive(Clone, Debug, Deserialize)]
pub struct SummaryDocument {
    pub page: PageInfo,
    pub status: OverallStatus,
    #[serde(default)]
    pub components: Vec<RawComponent>,
    #[serde(default)]
    pub incidents: Vec<RawIncident>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PageInfo {
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OverallStatus {
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawComponent {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub uptime: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawIncident {
    pub id: String,
    pub name: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}
