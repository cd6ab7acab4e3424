use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use pv_monitor::constants::{DEFAULT_INTERVAL_SECS, DEFAULT_TIME_WINDOW_SECS};
use pv_monitor::{CommandSource, CsvDump, Monitor, SimulatedSource, ValueSource};

#[derive(Parser)]
#[command(
    name = "pv_monitor",
    about = "Live strip-chart monitor for control-system process variables"
)]
struct Args {
    /// Process variable names to monitor, in subplot order
    #[arg(required = true)]
    pvs: Vec<String>,

    /// Seconds between samples
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval: f64,

    /// Trailing window shown on each redraw, in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_WINDOW_SECS)]
    window: f64,

    /// External client command used for batched reads (one value per line)
    #[arg(long, default_value = "caget")]
    caget_cmd: String,

    /// Generate waveforms locally instead of calling the external client
    #[arg(long)]
    simulate: bool,

    /// Append every sample as a CSV row to this file
    #[arg(long)]
    dump_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let source: Box<dyn ValueSource> = if args.simulate {
        Box::new(SimulatedSource::new())
    } else {
        Box::new(CommandSource::new(args.caget_cmd))
    };

    let mut monitor = Monitor::new(source, args.pvs)
        .with_interval(args.interval)
        .with_time_window(args.window);
    if let Some(path) = args.dump_file.as_deref() {
        monitor = monitor.with_dump(CsvDump::create(path)?);
    }

    pv_monitor::ui::run(monitor)?;
    Ok(())
}
