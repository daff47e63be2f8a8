use crate::parser::LogEntry;
use serde::Serialize;

/// Default bucket width for spike detection.
pub const DEFAULT_BUCKET_MS: i64 = 60_000;

/// A maximal contiguous run of over-threshold buckets. `start`/`end` are
/// millisecond epoch bounds; `count` is the total entries inside the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpikeWindow {
    pub start: i64,
    pub end: i64,
    pub count: usize,
}

/// Fixed-window burst detection: bucket entry timestamps into `bucket_ms`
/// slices over `[min, max + bucket_ms]`, then flag maximal contiguous runs of
/// buckets at or above `max(10, mean + 3*std)`. The absolute floor of 10
/// keeps sparse logs from producing spikes out of statistical noise.
/// Results are sorted by count descending.
pub fn detect_spikes(entries: &[LogEntry], bucket_ms: i64) -> Vec<SpikeWindow> {
    if entries.is_empty() || bucket_ms <= 0 {
        return Vec::new();
    }
    let mut times: Vec<i64> = entries.iter().map(|e| e.timestamp.timestamp_millis()).collect();
    times.sort_unstable();
    let start = times[0];
    let end = times[times.len() - 1];

    let n_buckets = ((end + bucket_ms - start) / bucket_ms + 1) as usize;
    let mut buckets = vec![0usize; n_buckets];
    for t in &times {
        let idx = ((t - start) / bucket_ms) as usize;
        buckets[idx] += 1;
    }

    let n = buckets.len() as f64;
    let mean = buckets.iter().sum::<usize>() as f64 / n;
    let var = buckets
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let threshold = (mean + 3.0 * var.sqrt()).max(10.0);

    let mut spikes = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut run_count = 0usize;
    for (i, &c) in buckets.iter().enumerate() {
        if c as f64 >= threshold {
            if run_start.is_none() {
                run_start = Some(i);
            }
            run_count += c;
        } else if let Some(s) = run_start.take() {
            spikes.push(SpikeWindow {
                start: start + s as i64 * bucket_ms,
                end: start + i as i64 * bucket_ms - 1,
                count: run_count,
            });
            run_count = 0;
        }
    }
    if let Some(s) = run_start {
        spikes.push(SpikeWindow {
            start: start + s as i64 * bucket_ms,
            end: start + n_buckets as i64 * bucket_ms - 1,
            count: run_count,
        });
    }

    spikes.sort_by(|a, b| b.count.cmp(&a.count));
    spikes
}
