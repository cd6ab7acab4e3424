use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Cell, Paragraph, Row, Table,
    },
    Frame, Terminal,
};

use crate::app::Monitor;
use crate::constants::GRID_COLS;
use crate::error::MonitorError;
use crate::util;

/// Set up the terminal, drive the sample/render loop until interrupted, and
/// restore the terminal before surfacing any error.
pub fn run(mut monitor: Monitor) -> Result<(), MonitorError> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_flag.store(true, Ordering::SeqCst))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, &mut monitor, &stop);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    monitor: &mut Monitor,
    stop: &AtomicBool,
) -> Result<(), MonitorError> {
    let interval = Duration::from_secs_f64(monitor.interval().max(0.0));

    loop {
        if stop.load(Ordering::SeqCst) {
            log::info!("interrupted, stopping after {} samples", monitor.len());
            return Ok(());
        }

        monitor.sample()?;
        let now = util::unix_now();
        terminal.draw(|f| draw(f, monitor, now))?;

        // Wait out the sampling interval, reading keys as they arrive.
        let deadline = Instant::now() + interval;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if is_quit_key(&key) {
                        log::info!("operator quit after {} samples", monitor.len());
                        return Ok(());
                    }
                }
            }
            if Instant::now() >= deadline {
                break;
            }
        }
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('q')
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Redraw the whole frame: the strip-chart grid over the trailing window, the
/// latest record as a one-row table, and a status bar.
fn draw(f: &mut Frame, monitor: &Monitor, now: f64) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(8),    // strip-chart grid
                Constraint::Length(4), // latest sample table
                Constraint::Length(1), // status bar
            ]
            .as_ref(),
        )
        .split(f.size());

    let start = monitor.window_start(now);
    draw_chart_grid(f, monitor, main_chunks[0], start, now);
    draw_latest_sample(f, monitor, main_chunks[1]);
    draw_status_bar(f, monitor, main_chunks[2], start, now);
}

fn draw_chart_grid(f: &mut Frame, monitor: &Monitor, area: Rect, start: f64, now: f64) {
    let n_rows = util::grid_rows(monitor.pv_list().len());
    if n_rows == 0 {
        let empty = Paragraph::new("no process variables configured")
            .block(Block::default().borders(Borders::ALL).title(" PV Monitor "));
        f.render_widget(empty, area);
        return;
    }

    let row_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, n_rows as u32); n_rows])
        .split(area);

    for (row, row_area) in row_chunks.iter().enumerate() {
        let col_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLS as u32); GRID_COLS])
            .split(*row_area);

        for col in 0..GRID_COLS {
            let i = row * GRID_COLS + col;
            let Some(name) = monitor.pv_list().get(i) else {
                break;
            };
            draw_strip_chart(f, monitor, col_chunks[col], name, start, now);
        }
    }
}

fn draw_strip_chart(f: &mut Frame, monitor: &Monitor, cell: Rect, name: &str, start: f64, now: f64) {
    let points = monitor.series(name, start, now);
    let (y_min, y_max) = y_bounds(&points);
    // Guard against a degenerate x range on the very first frame.
    let x_max = if now > start { now } else { start + 1.0 };

    let title = match points.last() {
        Some((_, v)) => format!(" {} {} ", name, util::format_value(*v)),
        None => format!(" {} ", name),
    };

    let start_label = monitor
        .latest()
        .map(|_| format_clock(start))
        .unwrap_or_default();
    let end_label = format_clock(now);

    let chart = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(ratatui::widgets::BorderType::Rounded)
                .title(title)
                .title_style(Style::default().fg(Color::Cyan)),
        )
        .marker(Marker::Braille)
        .x_bounds([start, x_max])
        .y_bounds([y_min, y_max])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &points,
                color: Color::Yellow,
            });
            ctx.print(
                start,
                y_min,
                Line::styled(start_label.clone(), Style::default().fg(Color::DarkGray)),
            );
            ctx.print(
                x_max,
                y_min,
                Line::styled(end_label.clone(), Style::default().fg(Color::DarkGray)),
            );
        });
    f.render_widget(chart, cell);
}

fn y_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &(_, v) in points {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn format_clock(unix_secs: f64) -> String {
    chrono::DateTime::from_timestamp(unix_secs.trunc() as i64, 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string()
}

fn draw_latest_sample(f: &mut Frame, monitor: &Monitor, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .title(" Latest Sample ");

    let Some(sample) = monitor.latest() else {
        f.render_widget(Paragraph::new("waiting for first sample...").block(block), area);
        return;
    };

    let columns = util::sample_columns(sample, monitor.pv_list());
    let n_cols = columns.len() + 1;

    let mut header_cells = vec![Cell::from("datetime")
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))];
    header_cells.extend(columns.iter().map(|name| {
        Cell::from(name.as_str())
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }));
    let header = Row::new(header_cells).height(1);

    let mut row_cells = vec![Cell::from(
        sample.datetime.format("%H:%M:%S%.3f").to_string(),
    )];
    row_cells.extend(columns.iter().map(|name| {
        let text = sample
            .values
            .get(name)
            .map(|v| util::format_value(*v))
            .unwrap_or_default();
        Cell::from(text).style(Style::default().fg(Color::Green))
    }));
    let row = Row::new(row_cells).height(1);

    let widths = vec![Constraint::Ratio(1, n_cols as u32); n_cols];
    let table = Table::new([row], widths).header(header).block(block);
    f.render_widget(table, area);
}

fn draw_status_bar(f: &mut Frame, monitor: &Monitor, area: Rect, start: f64, now: f64) {
    let status = Line::from(vec![
        Span::styled(
            " PV MONITOR ",
            Style::default()
                .bg(Color::White)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} PVs | window {:.0}s [{} .. {}] | interval {:.1}s | {} samples",
            monitor.pv_list().len(),
            monitor.time_window(),
            format_clock(start),
            format_clock(now),
            monitor.interval(),
            monitor.len(),
        )),
        Span::raw(" | Press 'q' to quit"),
    ]);
    let bar = Paragraph::new(status).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_bounds_default_when_no_points() {
        assert_eq!(y_bounds(&[]), (0.0, 1.0));
    }

    #[test]
    fn y_bounds_expand_a_flat_series() {
        assert_eq!(y_bounds(&[(0.0, 3.0), (1.0, 3.0)]), (2.0, 4.0));
    }

    #[test]
    fn y_bounds_pad_around_the_data() {
        let (lo, hi) = y_bounds(&[(0.0, 0.0), (1.0, 10.0)]);
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn quit_keys_are_q_and_ctrl_c() {
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(is_quit_key(&q));
        assert!(is_quit_key(&ctrl_c));
        assert!(!is_quit_key(&plain_c));
    }
}
