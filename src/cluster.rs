use crate::parser::LogEntry;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Default cap on the number of clusters returned.
pub const MAX_CLUSTERS: usize = 10;

/// JSON fields worth surfacing alongside a cluster sample.
pub const NOTABLE_FIELDS: [&str; 6] = ["code", "error", "name", "path", "method", "service"];

// Order matters: quoted literals first so ids/numbers inside them are gone
// before the hex and digit passes run on the lowercased text.
static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]+"|'[^']+'"#).unwrap());
static RE_HEX_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9a-f]{8,}\b").unwrap());
static RE_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A group of near-duplicate messages. `signature` is the normalized
/// de-duplication key (not meant for display); `sample` is the first raw
/// message seen; `fields` holds the first-occurrence values of
/// [`NOTABLE_FIELDS`] from structured entries in the group.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub signature: String,
    pub sample: String,
    pub count: usize,
    pub fields: BTreeMap<String, Value>,
}

/// Collapse variable tokens so near-duplicate messages share a signature:
/// lowercase, quoted literals -> `"<str>"`, long hex tokens -> `<id>`,
/// digit runs -> `<num>`, whitespace collapsed.
pub fn normalize_message(raw: &str) -> String {
    let s = raw.to_lowercase();
    let s = RE_QUOTED.replace_all(&s, "\"<str>\"");
    let s = RE_HEX_ID.replace_all(&s, "<id>");
    let s = RE_NUM.replace_all(&s, "<num>");
    let s = RE_WS.replace_all(&s, " ");
    s.trim().to_string()
}

/// Group entries by signature, sorted by count descending (first-seen order
/// breaks ties) and truncated to `max_clusters`. Structured entries with the
/// same normalized text but different top-level key shapes land in separate
/// clusters.
pub fn cluster_messages(entries: &[LogEntry], max_clusters: usize) -> Vec<Cluster> {
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut groups: Vec<Cluster> = Vec::new();

    for e in entries {
        let sig = signature_for(e);
        let slot = match index.get(&sig) {
            Some(&i) => i,
            None => {
                groups.push(Cluster {
                    signature: sig.clone(),
                    sample: sample_text(e).to_string(),
                    count: 0,
                    fields: BTreeMap::new(),
                });
                index.insert(sig, groups.len() - 1);
                groups.len() - 1
            }
        };
        let cluster = &mut groups[slot];
        cluster.count += 1;
        if e.is_json {
            if let Some(obj) = e.data.as_object() {
                for key in NOTABLE_FIELDS {
                    if let Some(v) = obj.get(key) {
                        // first occurrence wins, never overwritten
                        cluster.fields.entry(key.to_string()).or_insert_with(|| v.clone());
                    }
                }
            }
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(max_clusters);
    groups
}

fn signature_for(e: &LogEntry) -> String {
    let base = if e.is_json {
        let mut keys: Vec<&str> = e
            .data
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        serde_json::to_string(&keys).unwrap_or_default()
    } else {
        String::new()
    };
    format!("{}|{}", base, normalize_message(sample_text(e)))
}

fn sample_text(e: &LogEntry) -> &str {
    if e.message.is_empty() {
        &e.raw
    } else {
        &e.message
    }
}
