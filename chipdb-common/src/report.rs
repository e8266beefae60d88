//! Read-only queries over the component store
//!
//! - [`report`]: every record as `(kind, name, detail)`, insertion order
//! - [`optimize`]: one advisory per `Wire` record (placeholder heuristic)
//! - [`json_report`]: `(kind, name)` pairs shaped for the HTTP endpoint
//!
//! None of these mutate the store.

use crate::model::{Component, ComponentId, ComponentKind};
use crate::store::{ComponentFilter, ComponentStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const REPORT_HEADING: &str = "--- Report: Parsed Components ---";
const ADVISORY_HEADING: &str = "--- Optimization Suggestions ---";

/// One line of the full report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub kind: ComponentKind,
    pub name: String,
    pub detail: Option<String>,
}

impl From<Component> for ReportRow {
    fn from(component: Component) -> Self {
        Self {
            kind: component.kind,
            name: component.name,
            detail: component.detail,
        }
    }
}

/// Every stored record, in insertion order
pub async fn report(store: &ComponentStore) -> Result<Vec<ReportRow>> {
    let components = store.scan(&ComponentFilter::all()).await?;
    Ok(components.into_iter().map(ReportRow::from).collect())
}

/// Text rendering of [`report`] output
pub fn render_report(rows: &[ReportRow]) -> String {
    let mut out = format!("\n{REPORT_HEADING}\n");
    for row in rows {
        let _ = writeln!(
            out,
            "Type: {}, Name: {}, Details: {}",
            row.kind,
            row.name,
            row.detail.as_deref().unwrap_or("N/A")
        );
    }
    out
}

/// Non-binding optimization suggestion tied to one wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub component_id: ComponentId,
    pub wire: String,
}

impl Advisory {
    pub fn message(&self) -> String {
        format!(
            "Optimize wire: {} (e.g., check for redundancy or improve timing).",
            self.wire
        )
    }
}

/// One advisory per stored wire, in insertion order
pub async fn optimize(store: &ComponentStore) -> Result<Vec<Advisory>> {
    let wires = store.scan(&ComponentFilter::kind(ComponentKind::Wire)).await?;
    Ok(wires
        .into_iter()
        .map(|wire| Advisory {
            component_id: wire.id,
            wire: wire.name,
        })
        .collect())
}

/// Text rendering of [`optimize`] output
pub fn render_advisories(advisories: &[Advisory]) -> String {
    let mut out = format!("\n{ADVISORY_HEADING}\n");
    for advisory in advisories {
        let _ = writeln!(out, "{}", advisory.message());
    }
    out
}

/// JSON report element: `{"Type": "...", "Name": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "Type")]
    pub kind: ComponentKind,
    #[serde(rename = "Name")]
    pub name: String,
}

impl From<Component> for ReportEntry {
    fn from(component: Component) -> Self {
        Self {
            kind: component.kind,
            name: component.name,
        }
    }
}

/// Every stored record as `(kind, name)`, in insertion order
pub async fn json_report(store: &ComponentStore) -> Result<Vec<ReportEntry>> {
    let components = store.scan(&ComponentFilter::all()).await?;
    Ok(components.into_iter().map(ReportEntry::from).collect())
}
