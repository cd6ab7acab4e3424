use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::constants::{DEFAULT_INTERVAL_SECS, DEFAULT_TIME_WINDOW_SECS};
use crate::dump::CsvDump;
use crate::error::{MonitorError, SourceError};
use crate::source::ValueSource;
use crate::util;

/// Extra per-tick fields supplied by the embedding caller; on a name
/// collision with a fetched value the callback value wins.
pub type SampleCallback = Box<dyn FnMut() -> HashMap<String, f64>>;

/// One sampling tick: wall-clock stamp plus one value per monitored name
/// (and any callback extras).
pub struct Sample {
    /// Seconds since the Unix epoch.
    pub time: f64,
    /// Display timestamp derived from `time`.
    pub datetime: DateTime<Local>,
    pub values: HashMap<String, f64>,
}

impl Sample {
    pub fn new(time: f64, values: HashMap<String, f64>) -> Self {
        let datetime = DateTime::from_timestamp(time.trunc() as i64, (time.fract() * 1e9) as u32)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .with_timezone(&Local);
        Self {
            time,
            datetime,
            values,
        }
    }
}

/// Owns the monitored-name list, the value source, and the sample buffer.
/// The buffer is append-only and retains the full history for the process
/// lifetime; only a trailing window of it is ever rendered.
pub struct Monitor {
    pv_list: Vec<String>,
    interval: f64,
    time_window: f64,
    sample_callback: Option<SampleCallback>,
    source: Box<dyn ValueSource>,
    dump: Option<CsvDump>,
    data: Vec<Sample>,
}

impl Monitor {
    pub fn new(source: Box<dyn ValueSource>, pv_list: Vec<String>) -> Self {
        Self {
            pv_list,
            interval: DEFAULT_INTERVAL_SECS,
            time_window: DEFAULT_TIME_WINDOW_SECS,
            sample_callback: None,
            source,
            dump: None,
            data: Vec::new(),
        }
    }

    /// Seconds between samples.
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval = seconds;
        self
    }

    /// Trailing span of history shown on each redraw, in seconds.
    pub fn with_time_window(mut self, seconds: f64) -> Self {
        self.time_window = seconds;
        self
    }

    pub fn with_sample_callback(mut self, callback: SampleCallback) -> Self {
        self.sample_callback = Some(callback);
        self
    }

    pub fn with_dump(mut self, dump: CsvDump) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn pv_list(&self) -> &[String] {
        &self.pv_list
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn time_window(&self) -> f64 {
        self.time_window
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.data.last()
    }

    /// Take one sample stamped with the current wall clock.
    pub fn sample(&mut self) -> Result<(), MonitorError> {
        self.sample_at(util::unix_now())
    }

    /// Take one sample stamped with an explicit acquisition time. Fetch
    /// failures propagate; the buffer is untouched on error.
    pub fn sample_at(&mut self, now: f64) -> Result<(), MonitorError> {
        let fetched = self.source.read_many(&self.pv_list)?;
        if fetched.len() != self.pv_list.len() {
            return Err(SourceError::ShortRead {
                requested: self.pv_list.len(),
                got: fetched.len(),
            }
            .into());
        }

        let mut values: HashMap<String, f64> =
            self.pv_list.iter().cloned().zip(fetched).collect();
        if let Some(callback) = self.sample_callback.as_mut() {
            for (name, value) in callback() {
                values.insert(name, value);
            }
        }

        let sample = Sample::new(now, values);
        log::info!("{}", util::format_sample_line(&sample, &self.pv_list));
        if let Some(dump) = self.dump.as_mut() {
            dump.append(&sample, &self.pv_list)?;
        }
        self.data.push(sample);
        Ok(())
    }

    /// Start of the trailing window at acquisition time `now`; falls back to
    /// the epoch before the first sample exists.
    pub fn window_start(&self, now: f64) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            now - self.time_window
        }
    }

    /// (time, value) points for one name within [start, end], both bounds
    /// inclusive, in acquisition order.
    pub fn series(&self, name: &str, start: f64, end: f64) -> Vec<(f64, f64)> {
        self.data
            .iter()
            .filter(|s| s.time >= start && s.time <= end)
            .filter_map(|s| s.values.get(name).map(|v| (s.time, *v)))
            .collect()
    }
}
