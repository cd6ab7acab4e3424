//! Live strip-chart monitor for control-system process variables.
//!
//! Polls a fixed list of named process variables through a [`source::ValueSource`],
//! accumulates one record per tick into an in-memory table, and redraws a grid
//! of trailing-window strip charts in the terminal.

pub mod app;
pub mod constants;
pub mod dump;
pub mod error;
pub mod source;
pub mod ui;
pub mod util;

pub use app::{Monitor, Sample, SampleCallback};
pub use dump::CsvDump;
pub use error::{MonitorError, SourceError};
pub use source::{CommandSource, SimulatedSource, ValueSource};
