use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::process::Command;
use std::time::Instant;

use crate::error::SourceError;

/// One batched "read current values for these names" call against whatever
/// link the control system exposes. Values are positionally aligned with the
/// requested names. Latency and failure modes are the source's own business;
/// the monitor enforces no timeout of its own.
pub trait ValueSource {
    fn read_many(&mut self, names: &[String]) -> Result<Vec<f64>, SourceError>;
}

/// Delegates acquisition to an external command-line client (a `caget`-style
/// tool): one invocation per tick with all names as arguments, one numeric
/// value per output line.
pub struct CommandSource {
    program: String,
}

impl CommandSource {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ValueSource for CommandSource {
    fn read_many(&mut self, names: &[String]) -> Result<Vec<f64>, SourceError> {
        let output = Command::new(&self.program)
            .arg("-t")
            .args(names)
            .output()
            .map_err(|e| SourceError::Read(format!("spawn {}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(SourceError::Read(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.parse::<f64>()
                    .map_err(|_| SourceError::Read(format!("unparsable value: {:?}", l)))
            })
            .collect()
    }
}

/// Deterministic waveform generator for demo runs without a live control
/// system. Each name gets a phase and scale from its hash, so different PVs
/// trace visibly different curves.
pub struct SimulatedSource {
    started: Instant,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn params(name: &str) -> (f64, f64) {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let h = hasher.finish();
        let phase = (h % 628) as f64 / 100.0;
        let scale = 1.0 + (h >> 16 & 0x7) as f64;
        (phase, scale)
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueSource for SimulatedSource {
    fn read_many(&mut self, names: &[String]) -> Result<Vec<f64>, SourceError> {
        let t = self.started.elapsed().as_secs_f64();
        Ok(names
            .iter()
            .map(|name| {
                let (phase, scale) = Self::params(name);
                scale * (std::f64::consts::TAU * 0.2 * t + phase).sin()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_source_aligns_values_with_names() {
        let mut source = SimulatedSource::new();
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let values = source.read_many(&names).unwrap();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn simulated_source_values_are_bounded_by_scale() {
        let mut source = SimulatedSource::new();
        let names = vec!["BPM:X".to_string()];
        for _ in 0..10 {
            let values = source.read_many(&names).unwrap();
            assert!(values[0].abs() <= 8.0);
        }
    }

    #[test]
    fn simulated_source_handles_empty_name_list() {
        let mut source = SimulatedSource::new();
        assert!(source.read_many(&[]).unwrap().is_empty());
    }
}
