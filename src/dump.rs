use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::app::Sample;
use crate::util;

/// Appends every sampled record to a CSV file as it is taken. The header is
/// written once, from the columns of the first record; later records missing
/// a header column leave that cell empty.
pub struct CsvDump {
    file: File,
    columns: Option<Vec<String>>,
}

impl CsvDump {
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file,
            columns: None,
        })
    }

    pub fn append(&mut self, sample: &Sample, pv_list: &[String]) -> io::Result<()> {
        if self.columns.is_none() {
            let columns = util::sample_columns(sample, pv_list);
            writeln!(self.file, "time,datetime,{}", columns.join(","))?;
            self.columns = Some(columns);
        }
        let columns = self.columns.as_ref().unwrap();

        let mut row = format!(
            "{:.6},{}",
            sample.time,
            sample.datetime.format("%Y-%m-%dT%H:%M:%S%.3f")
        );
        for name in columns {
            row.push(',');
            if let Some(v) = sample.values.get(name) {
                row.push_str(&v.to_string());
            }
        }
        writeln!(self.file, "{}", row)?;
        self.file.flush()
    }
}
