use crate::category::{categorize_error, ErrorCategory};
use crate::cluster::{cluster_messages, Cluster, MAX_CLUSTERS};
use crate::parser::LogEntry;
use crate::spike::{detect_spikes, SpikeWindow, DEFAULT_BUCKET_MS};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed summary used when the input holds no error-level entries.
pub const NO_INCIDENTS_SUMMARY: &str = "No error-level incidents detected in the current view.";

/// Millisecond epoch bounds of the error set, min/max over timestamps
/// regardless of input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub category: &'static ErrorCategory,
    pub count: usize,
    pub percentage: u32,
}

/// The aggregate analysis result. Plain data, fully serializable.
/// `llm_summary` is absent from the synchronous analysis and only set by a
/// later narrative upgrade; `token` is the caller-supplied correlation tag
/// for discarding upgrades that arrive after a newer analysis replaced this
/// one.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentAnalysis {
    pub token: u64,
    pub total: usize,
    pub time_range: Option<TimeRange>,
    pub spikes: Vec<SpikeWindow>,
    pub clusters: Vec<Cluster>,
    pub categories: Vec<CategoryBreakdown>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_summary: Option<String>,
}

/// Analyze with the default correlation token. See [`analyze_incident_tagged`].
pub fn analyze_incident(entries: &[LogEntry]) -> IncidentAnalysis {
    analyze_incident_tagged(entries, 0)
}

/// Synchronous, deterministic incident analysis: filter to error-level
/// entries, detect spikes, narrow focus to the dominant spike window (or all
/// errors when none), then cluster and categorize the focus set. `token` is
/// stored verbatim on the result.
pub fn analyze_incident_tagged(entries: &[LogEntry], token: u64) -> IncidentAnalysis {
    let errors: Vec<LogEntry> = entries.iter().filter(|e| e.level.is_error()).cloned().collect();
    let total = errors.len();

    let time_range = match errors.iter().map(|e| e.timestamp.timestamp_millis()).minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(t) => Some(TimeRange { start: t, end: t }),
        MinMaxResult::MinMax(start, end) => Some(TimeRange { start, end }),
    };

    let spikes = detect_spikes(&errors, DEFAULT_BUCKET_MS);
    let focus: Vec<LogEntry> = if let Some(top) = spikes.first() {
        errors
            .iter()
            .filter(|e| {
                let t = e.timestamp.timestamp_millis();
                t >= top.start && t <= top.end
            })
            .cloned()
            .collect()
    } else {
        errors
    };

    let clusters = cluster_messages(&focus, MAX_CLUSTERS);

    // Keyed by priority so the breakdown comes out sorted highest-first.
    let mut counts: BTreeMap<u8, (usize, &'static ErrorCategory)> = BTreeMap::new();
    for e in &focus {
        let category = categorize_error(&e.message, &e.data);
        counts.entry(category.priority).or_insert((0, category)).0 += 1;
    }
    let categories: Vec<CategoryBreakdown> = counts
        .into_values()
        .map(|(count, category)| CategoryBreakdown {
            category,
            count,
            percentage: ((count as f64 / focus.len() as f64) * 100.0).round() as u32,
        })
        .collect();

    // Prefer a repeated cluster's sample; a cluster of one is no pattern, so
    // fall back to the highest-priority category's description.
    let top_pattern = match clusters.first() {
        Some(c) if c.count > 1 => c.sample.clone(),
        _ => categories
            .first()
            .map(|b| b.category.description.to_string())
            .unwrap_or_default(),
    };

    let summary = if total == 0 {
        NO_INCIDENTS_SUMMARY.to_string()
    } else {
        let kind = if spikes.is_empty() { "an incident" } else { "a spike" };
        format!(
            "Detected {kind} with {} error events. Top pattern: \"{top_pattern}\"",
            focus.len()
        )
    };

    IncidentAnalysis {
        token,
        total,
        time_range,
        spikes,
        clusters,
        categories,
        summary,
        llm_summary: None,
    }
}
