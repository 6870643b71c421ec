use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Tick, TrialIndex};

/// What happened during one tick of one trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickMetrics {
    pub tick: Tick,
    pub arrivals: u32,
    pub served: u32,
    pub unserved: u32,
    pub departures: u32,
    pub stay_durations: Vec<u32>,
}

/// Per-tick record handed to external consumers (renderers, NDJSON files).
/// Self-contained: a consumer never needs access to simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub trial_index: TrialIndex,
    pub tick_index: Tick,
    pub hour_label: String,
    pub zone_occupancies: Vec<u32>,
    pub zone_capacities: Vec<u32>,
    pub arrivals: u32,
    pub served: u32,
    pub unserved: u32,
    pub departures: u32,
    pub stay_durations: Vec<u32>,
    pub served_cumulative: u64,
    pub unserved_cumulative: u64,
}

/// Receives every snapshot as it is produced. Sinks cannot report failure back
/// into the simulation; a broken sink only loses its own output.
pub trait SnapshotSink {
    fn record(&mut self, snapshot: &TickSnapshot);

    /// `false` lets runners skip building snapshots nobody will read.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn record(&mut self, _snapshot: &TickSnapshot) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

impl SnapshotSink for Vec<TickSnapshot> {
    fn record(&mut self, snapshot: &TickSnapshot) {
        self.push(snapshot.clone());
    }
}

/// One JSON object per line. After the first write error the sink goes quiet.
pub struct NdjsonSink<W: Write> {
    writer: W,
    written: u64,
    failed: bool,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        NdjsonSink { writer, written: 0, failed: false }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> SnapshotSink for NdjsonSink<W> {
    fn record(&mut self, snapshot: &TickSnapshot) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, snapshot)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.writer));
        match result {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!(
                    trial = snapshot.trial_index.0,
                    tick = snapshot.tick_index.0,
                    error = %e,
                    "snapshot sink failed; dropping remaining snapshots"
                );
                self.failed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn snapshot(tick: u32) -> TickSnapshot {
        TickSnapshot {
            trial_index: TrialIndex(0),
            tick_index: Tick(tick),
            hour_label: Tick(tick).hour_label(6),
            zone_occupancies: vec![3, 1, 0],
            zone_capacities: vec![45, 20, 10],
            arrivals: 4,
            served: 4,
            unserved: 0,
            departures: 0,
            stay_durations: vec![2, 3, 1, 4],
            served_cumulative: 4,
            unserved_cumulative: 0,
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn snapshot_json_shape() {
        let value = serde_json::to_value(snapshot(0)).unwrap();
        assert_eq!(value["trial_index"], 0);
        assert_eq!(value["tick_index"], 0);
        assert_eq!(value["hour_label"], "06:00");
        assert_eq!(value["zone_occupancies"], serde_json::json!([3, 1, 0]));
        assert_eq!(value["served_cumulative"], 4);
    }

    #[test]
    fn ndjson_stream_one_line_per_snapshot() {
        let mut sink = NdjsonSink::new(Vec::new());
        for t in 0..3 {
            sink.record(&snapshot(t));
        }
        assert_eq!(sink.written(), 3);

        let buf = sink.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.split('\n').filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        for (t, line) in lines.iter().enumerate() {
            let back: TickSnapshot = serde_json::from_str(line).unwrap();
            assert_eq!(back, snapshot(t as u32));
        }
    }

    #[test]
    fn broken_writer_marks_sink_failed_without_panicking() {
        let mut sink = NdjsonSink::new(BrokenWriter);
        sink.record(&snapshot(0));
        sink.record(&snapshot(1));
        assert!(sink.has_failed());
        assert_eq!(sink.written(), 0);
    }

    #[test]
    fn vec_sink_collects_and_null_sink_opts_out() {
        let mut v: Vec<TickSnapshot> = Vec::new();
        v.record(&snapshot(5));
        assert_eq!(v.len(), 1);
        assert!(v.is_enabled());
        assert!(!NullSink.is_enabled());
    }
}
