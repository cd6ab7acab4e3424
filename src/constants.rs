/// Fixed column count of the strip-chart grid; rows = ceil(n_pvs / GRID_COLS).
pub const GRID_COLS: usize = 5;

pub const DEFAULT_INTERVAL_SECS: f64 = 0.0;
pub const DEFAULT_TIME_WINDOW_SECS: f64 = 20.0;
