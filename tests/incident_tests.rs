use chrono::{Duration, TimeZone, Utc};
use incidentscope::incident::{analyze_incident, analyze_incident_tagged, NO_INCIDENTS_SUMMARY};
use incidentscope::parser::{LogEntry, LogLevel};

fn entry(id: usize, level: LogLevel, ts: chrono::DateTime<Utc>, message: &str) -> LogEntry {
    LogEntry {
        id,
        level,
        timestamp: ts,
        message: message.to_string(),
        data: serde_json::json!({ "message": message }),
        raw: message.to_string(),
        is_json: false,
    }
}

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn empty_input_yields_the_fixed_no_incident_analysis() {
    let analysis = analyze_incident(&[]);
    assert_eq!(analysis.token, 0);
    assert_eq!(analysis.total, 0);
    assert!(analysis.time_range.is_none());
    assert!(analysis.spikes.is_empty());
    assert!(analysis.clusters.is_empty());
    assert!(analysis.categories.is_empty());
    assert_eq!(analysis.summary, NO_INCIDENTS_SUMMARY);
    assert!(analysis.llm_summary.is_none());
}

#[test]
fn non_error_levels_are_ignored() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Info, t, "database down"),
        entry(1, LogLevel::Warn, t, "database down"),
        entry(2, LogLevel::Debug, t, "database down"),
    ];
    let analysis = analyze_incident(&entries);
    assert_eq!(analysis.total, 0);
    assert_eq!(analysis.summary, NO_INCIDENTS_SUMMARY);
}

#[test]
fn scattered_errors_without_a_spike_report_an_incident() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Error, t, "database down"),
        entry(1, LogLevel::Error, t + Duration::hours(1), "database down"),
        entry(2, LogLevel::Error, t + Duration::hours(2), "database down"),
    ];
    let analysis = analyze_incident(&entries);
    assert_eq!(analysis.total, 3);
    assert!(analysis.spikes.is_empty());
    assert!(analysis.summary.contains("an incident"));
    assert!(analysis.summary.contains("3 error events"));
}

#[test]
fn focus_narrows_to_the_dominant_spike_window() {
    let t = base_time();
    let mut entries = Vec::new();
    for i in 0..100 {
        entries.push(entry(i, LogLevel::Error, t + Duration::seconds((i % 60) as i64), "connection refused"));
    }
    for h in 1..=5 {
        entries.push(entry(100 + h as usize, LogLevel::Error, t + Duration::hours(h), "unrelated straggler zzz"));
    }

    let analysis = analyze_incident(&entries);
    assert_eq!(analysis.total, 105);
    assert!(!analysis.spikes.is_empty());
    assert_eq!(analysis.spikes[0].count, 100);
    // clusters and categories cover only the spike window
    let clustered: usize = analysis.clusters.iter().map(|c| c.count).sum();
    assert_eq!(clustered, 100);
    let categorized: usize = analysis.categories.iter().map(|c| c.count).sum();
    assert_eq!(categorized, 100);
    assert!(analysis.summary.contains("a spike"));
    assert!(analysis.summary.contains("100 error events"));
}

#[test]
fn category_counts_sum_to_focus_and_sort_by_priority() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Error, t, "mystery failure alpha"),
        entry(1, LogLevel::Error, t + Duration::minutes(5), "mystery failure beta"),
        entry(2, LogLevel::Error, t + Duration::minutes(10), "mystery failure gamma"),
        entry(3, LogLevel::Error, t + Duration::minutes(15), "database rollback happened"),
    ];
    let analysis = analyze_incident(&entries);
    assert_eq!(analysis.categories.len(), 2);
    // Database (priority 1) first even though the other bucket has more
    // entries. The mystery entries match Queue via the synthetic payload's
    // "message" key, the same way unstructured entries do upstream.
    assert_eq!(analysis.categories[0].category.name, "Database");
    assert_eq!(analysis.categories[0].count, 1);
    assert_eq!(analysis.categories[0].percentage, 25);
    assert_eq!(analysis.categories[1].category.name, "Queue");
    assert_eq!(analysis.categories[1].count, 3);
    assert_eq!(analysis.categories[1].percentage, 75);
    let total: usize = analysis.categories.iter().map(|c| c.count).sum();
    assert_eq!(total, 4);
}

#[test]
fn rounded_percentages_need_not_sum_to_one_hundred() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Error, t, "database rollback happened"),
        entry(1, LogLevel::Error, t + Duration::minutes(5), "jwt expired badly"),
        entry(2, LogLevel::Error, t + Duration::minutes(10), "weird mystery thing"),
    ];
    let analysis = analyze_incident(&entries);
    assert_eq!(analysis.categories.len(), 3);
    let counts: usize = analysis.categories.iter().map(|c| c.count).sum();
    assert_eq!(counts, 3);
    // three one-third shares each round to 33
    let percentages: u32 = analysis.categories.iter().map(|c| c.percentage).sum();
    assert_eq!(percentages, 99);
}

#[test]
fn repeated_cluster_sample_becomes_the_top_pattern() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Error, t, "payment gateway timeout for order 1"),
        entry(1, LogLevel::Error, t + Duration::minutes(1), "payment gateway timeout for order 2"),
        entry(2, LogLevel::Error, t + Duration::minutes(2), "some other mystery"),
    ];
    let analysis = analyze_incident(&entries);
    assert!(analysis
        .summary
        .contains("payment gateway timeout for order 1"));
}

#[test]
fn singleton_clusters_fall_back_to_category_description() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Error, t, "database exploded spectacularly"),
        entry(1, LogLevel::Error, t + Duration::minutes(1), "something else entirely happened"),
    ];
    let analysis = analyze_incident(&entries);
    assert!(analysis.clusters.iter().all(|c| c.count == 1));
    assert!(analysis
        .summary
        .contains("Database connection, query, or transaction failures"));
}

#[test]
fn time_range_is_min_max_regardless_of_input_order() {
    let t = base_time();
    let entries = vec![
        entry(0, LogLevel::Error, t + Duration::hours(2), "late failure"),
        entry(1, LogLevel::Error, t, "early failure"),
        entry(2, LogLevel::Error, t + Duration::hours(1), "middle failure"),
    ];
    let analysis = analyze_incident(&entries);
    let range = analysis.time_range.unwrap();
    assert_eq!(range.start, t.timestamp_millis());
    assert_eq!(range.end, (t + Duration::hours(2)).timestamp_millis());
}

#[test]
fn caller_token_is_stored_verbatim() {
    let analysis = analyze_incident_tagged(&[], 42);
    assert_eq!(analysis.token, 42);
}

#[test]
fn analysis_serializes_as_plain_data() {
    let t = base_time();
    let entries = vec![entry(0, LogLevel::Error, t, "database down")];
    let analysis = analyze_incident(&entries);
    let v = serde_json::to_value(&analysis).unwrap();
    assert_eq!(v["total"], 1);
    assert!(v.get("llm_summary").is_none());
    assert!(v["categories"][0]["category"]["priority"].is_number());
    assert_eq!(v["time_range"]["start"], t.timestamp_millis());
}
