//! Line-oriented driver: read records, feed the tracker, write metrics.

use crate::record::{parse_record, RecordError};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{BufRead, Write};
use window_graph::{
    BackendKind, DegreeTracker, EdgeBackend, Event, OrderedEdgeStore, RescanGraph, SearchKind,
    WindowPolicy,
};

/// Counters for one pass over an input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub lines: u64,
    pub parsed: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub edges: usize,
    pub vertices: usize,
}

/// Parse one line, logging and discarding anything unusable.
pub fn read_event(line_no: u64, line: &str) -> Option<Event> {
    match parse_record(line) {
        Ok(event) => Some(event),
        Err(RecordError::Blank) => None,
        Err(e) => {
            tracing::debug!(line = line_no, "skipping record: {e}");
            None
        }
    }
}

/// Stream metrics for every parsed line of `reader` into `writer`, one per
/// line, in input order.
pub fn run<R, W, B>(reader: R, mut writer: W, tracker: &mut DegreeTracker<B>) -> Result<RunSummary>
where
    R: BufRead,
    W: Write,
    B: EdgeBackend,
{
    let mut summary = RunSummary::default();

    for line in reader.lines() {
        let line = line.context("Failed to read input line")?;
        summary.lines += 1;

        let Some(event) = read_event(summary.lines, &line) else {
            summary.skipped += 1;
            continue;
        };
        summary.parsed += 1;

        let metric = tracker.process(&event);
        writeln!(writer, "{metric}").context("Failed to write metric")?;
    }
    writer.flush().context("Failed to flush output")?;

    let metric = tracker.average_degree();
    summary.rejected = tracker.rejected();
    summary.edges = metric.edges;
    summary.vertices = metric.vertices;
    Ok(summary)
}

/// Build a tracker from configured names.
pub fn build_tracker(
    window_secs: u32,
    backend: BackendKind,
    search: SearchKind,
) -> Result<DegreeTracker<Box<dyn EdgeBackend>>> {
    let window = WindowPolicy::new(window_secs).context("Invalid window length")?;
    Ok(DegreeTracker::with_backend(window, backend.build(search)))
}

/// First record where the ordered store and the rescan oracle disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub line: u64,
    pub ordered: String,
    pub rescan: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub records: u64,
    pub divergence: Option<Divergence>,
}

/// Run the ordered store and the rescan oracle side by side, checking both
/// sets of invariants after every record. Stops at the first disagreement.
pub fn verify<R: BufRead>(reader: R, window_secs: u32, search: SearchKind) -> Result<VerifyReport> {
    let window = WindowPolicy::new(window_secs).context("Invalid window length")?;
    let mut ordered =
        DegreeTracker::with_backend(window, OrderedEdgeStore::with_search(search.strategy()));
    let mut oracle = DegreeTracker::with_backend(window, RescanGraph::new());
    let mut report = VerifyReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input line")?;
        let line_no = index as u64 + 1;
        let Some(event) = read_event(line_no, &line) else {
            continue;
        };
        report.records += 1;

        let expected = oracle.process(&event).to_string();
        let actual = ordered.process(&event).to_string();

        ordered
            .check_invariants()
            .with_context(|| format!("Ordered store inconsistent after line {line_no}"))?;
        oracle
            .check_invariants()
            .with_context(|| format!("Rescan graph inconsistent after line {line_no}"))?;

        if actual != expected {
            tracing::warn!(line = line_no, %actual, %expected, "backends diverged");
            report.divergence = Some(Divergence {
                line: line_no,
                ordered: actual,
                rescan: expected,
            });
            break;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INPUT: &str = concat!(
        r#"{"created_at":"Thu Oct 29 17:51:01 +0000 2015","entities":{"hashtags":[{"text":"Spark"},{"text":"Apache"}]}}"#,
        "\n",
        r#"{"limit":{"track":5}}"#,
        "\n",
        r#"{"created_at":"Thu Oct 29 17:51:30 +0000 2015","entities":{"hashtags":[{"text":"Apache"},{"text":"Hadoop"},{"text":"Storm"}]}}"#,
        "\n",
        "\n",
        r#"{"created_at":"Thu Oct 29 17:51:56 +0000 2015","entities":{"hashtags":[{"text":"Flink"},{"text":"Spark"}]}}"#,
        "\n",
        r#"{"created_at":"Thu Oct 29 17:51:59 +0000 2015","entities":{"hashtags":[{"text":"HBase"}]}}"#,
        "\n",
        r#"{"created_at":"Thu Oct 29 17:52:05 +0000 2015","entities":{"hashtags":[{"text":"Apache"}]}}"#,
        "\n",
        r#"{"created_at":"Thu Oct 29 17:50:00 +0000 2015","entities":{"hashtags":[{"text":"Old"},{"text":"News"}]}}"#,
        "\n",
    );

    #[test]
    fn run_emits_one_line_per_parsed_record() {
        let mut tracker = build_tracker(60, BackendKind::Ordered, SearchKind::Backward).unwrap();
        let mut out = Vec::new();
        let summary = run(Cursor::new(INPUT), &mut out, &mut tracker).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // 17:52:05 evicts Spark-Apache (17:51:01 < 17:51:05).
        assert_eq!(lines, vec!["1.00", "2.00", "2.00", "2.00", "1.60", "1.60"]);
        assert_eq!(summary.lines, 8);
        assert_eq!(summary.parsed, 6);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.edges, 4);
        assert_eq!(summary.vertices, 5);
    }

    #[test]
    fn verify_finds_no_divergence() {
        let report = verify(Cursor::new(INPUT), 60, SearchKind::Binary).unwrap();
        assert_eq!(report.records, 6);
        assert!(report.divergence.is_none());
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(build_tracker(0, BackendKind::Rescan, SearchKind::Backward).is_err());
    }
}
