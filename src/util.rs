use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::Sample;
use crate::constants::GRID_COLS;

/// Wall-clock seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Rows needed for a row-major grid of `n` cells with GRID_COLS columns.
pub fn grid_rows(n: usize) -> usize {
    n.div_ceil(GRID_COLS)
}

/// Record columns in display order: the monitored names first, then any
/// callback-supplied extras in sorted order.
pub fn sample_columns(sample: &Sample, pv_list: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = pv_list.to_vec();
    let mut extras: Vec<String> = sample
        .values
        .keys()
        .filter(|k| !pv_list.contains(k))
        .cloned()
        .collect();
    extras.sort();
    columns.extend(extras);
    columns
}

pub fn format_value(v: f64) -> String {
    let abs = v.abs();
    if abs != 0.0 && (abs >= 1e6 || abs < 1e-3) {
        format!("{:.3e}", v)
    } else {
        format!("{:.3}", v)
    }
}

/// Single-row tabular echo of one record, emitted per tick for visibility.
pub fn format_sample_line(sample: &Sample, pv_list: &[String]) -> String {
    let mut line = sample.datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    for name in sample_columns(sample, pv_list) {
        if let Some(v) = sample.values.get(&name) {
            line.push_str(&format!("  {}={}", name, format_value(*v)));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn grid_rows_matches_ceil_division() {
        assert_eq!(grid_rows(0), 0);
        assert_eq!(grid_rows(1), 1);
        assert_eq!(grid_rows(5), 1);
        assert_eq!(grid_rows(6), 2);
        assert_eq!(grid_rows(11), 3);
    }

    #[test]
    fn sample_columns_keeps_pv_order_then_sorted_extras() {
        let mut values = HashMap::new();
        values.insert("B".to_string(), 2.0);
        values.insert("A".to_string(), 1.0);
        values.insert("z_extra".to_string(), 9.0);
        values.insert("a_extra".to_string(), 8.0);
        let sample = Sample::new(0.0, values);
        let pvs = vec!["B".to_string(), "A".to_string()];
        assert_eq!(sample_columns(&sample, &pvs), vec!["B", "A", "a_extra", "z_extra"]);
    }

    #[test]
    fn format_value_switches_to_scientific_for_extremes() {
        assert_eq!(format_value(0.0), "0.000");
        assert_eq!(format_value(1.5), "1.500");
        assert_eq!(format_value(2_500_000.0), "2.500e6");
        assert_eq!(format_value(0.0001), "1.000e-4");
    }
}
