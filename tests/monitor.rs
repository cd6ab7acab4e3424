use std::collections::HashMap;

use pv_monitor::{CsvDump, Monitor, SampleCallback, SourceError, ValueSource};

/// Returns canned batches in order, then fails like a dropped link.
struct ReplaySource {
    batches: Vec<Vec<f64>>,
    cursor: usize,
}

impl ReplaySource {
    fn new(batches: Vec<Vec<f64>>) -> Box<Self> {
        Box::new(Self { batches, cursor: 0 })
    }
}

impl ValueSource for ReplaySource {
    fn read_many(&mut self, _names: &[String]) -> Result<Vec<f64>, SourceError> {
        let batch = self
            .batches
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| SourceError::Read("replay exhausted".into()))?;
        self.cursor += 1;
        Ok(batch)
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn full_run_accumulates_windows_and_dumps() {
    let dir = tempfile::tempdir().unwrap();
    let dump_path = dir.path().join("run.csv");

    let source = ReplaySource::new(vec![
        vec![1.0, 2.0],
        vec![3.0, 4.0],
        vec![5.0, 6.0],
    ]);
    let callback: SampleCallback = Box::new(|| {
        let mut extra = HashMap::new();
        extra.insert("ring_energy".to_string(), 3.0);
        extra
    });
    let mut monitor = Monitor::new(source, names(&["BPM:X", "BPM:Y"]))
        .with_time_window(10.0)
        .with_sample_callback(callback)
        .with_dump(CsvDump::create(&dump_path).unwrap());

    monitor.sample_at(0.0).unwrap();
    monitor.sample_at(5.0).unwrap();
    monitor.sample_at(11.0).unwrap();
    assert_eq!(monitor.len(), 3);

    // The trailing 10 s window at t=11 drops only the t=0 record.
    let start = monitor.window_start(11.0);
    assert_eq!(start, 1.0);
    assert_eq!(
        monitor.series("BPM:X", start, 11.0),
        vec![(5.0, 3.0), (11.0, 5.0)]
    );
    assert_eq!(
        monitor.series("BPM:Y", start, 11.0),
        vec![(5.0, 4.0), (11.0, 6.0)]
    );
    // The buffer itself keeps the full history.
    assert_eq!(monitor.series("BPM:X", 0.0, 11.0).len(), 3);

    let csv = std::fs::read_to_string(&dump_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "time,datetime,BPM:X,BPM:Y,ring_energy");
    assert!(lines[1].ends_with(",1,2,3"));
    assert!(lines[3].ends_with(",5,6,3"));
}

#[test]
fn exhausted_source_stops_accumulation_at_the_failing_tick() {
    let source = ReplaySource::new(vec![vec![1.0]]);
    let mut monitor = Monitor::new(source, names(&["A"]));

    monitor.sample_at(0.0).unwrap();
    assert!(monitor.sample_at(1.0).is_err());
    assert_eq!(monitor.len(), 1);
}

#[test]
fn zero_variables_is_a_valid_configuration() {
    let source = ReplaySource::new(vec![vec![], vec![]]);
    let mut monitor = Monitor::new(source, Vec::new());
    monitor.sample_at(0.0).unwrap();
    monitor.sample_at(1.0).unwrap();
    assert_eq!(monitor.len(), 2);
    assert_eq!(pv_monitor::util::grid_rows(monitor.pv_list().len()), 0);
}
