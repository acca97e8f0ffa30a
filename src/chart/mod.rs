//! SVG line chart of a volume's free-space history.

use std::path::{Path, PathBuf};

use askama::Template;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use crate::storage::LogEntry;
use crate::units::GB;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 450;
const PLOT_LEFT: u32 = 80;
const PLOT_RIGHT: u32 = 870;
const PLOT_TOP: u32 = 50;
const PLOT_BOTTOM: u32 = 380;
const Y_TICKS: usize = 5;
const X_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("need at least 2 data points to draw a chart, have {have}")]
    NotEnoughPoints { have: usize },

    #[error("failed to render chart template")]
    Render(#[from] askama::Error),

    #[error("failed to write chart {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

struct Tick {
    pos: String,
    label: String,
}

struct Point {
    x: String,
    y: String,
}

#[derive(Template)]
#[template(path = "chart.svg", escape = "html")]
struct ChartTemplate {
    title: String,
    width: u32,
    height: u32,
    center_x: u32,
    center_y: u32,
    plot_left: u32,
    plot_right: u32,
    plot_top: u32,
    plot_bottom: u32,
    y_label_x: u32,
    x_label_y: u32,
    x_title_y: u32,
    y_ticks: Vec<Tick>,
    x_ticks: Vec<Tick>,
    polyline: String,
    points: Vec<Point>,
}

/// Render free space (GB) over time as an SVG document.
pub fn render_svg(volume: &str, entries: &[LogEntry]) -> Result<String, ChartError> {
    if entries.len() < 2 {
        return Err(ChartError::NotEnoughPoints {
            have: entries.len(),
        });
    }

    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| entry.timestamp);

    let first = sorted[0].timestamp;
    let last = sorted[sorted.len() - 1].timestamp;
    let time_span = seconds_between(first, last);

    let (y_low, y_high) = value_range(&sorted);
    let plot_width = f64::from(PLOT_RIGHT - PLOT_LEFT);
    let plot_height = f64::from(PLOT_BOTTOM - PLOT_TOP);

    let x_at = |timestamp: NaiveDateTime| {
        let fraction = if time_span > 0.0 {
            seconds_between(first, timestamp) / time_span
        } else {
            0.5
        };
        f64::from(PLOT_LEFT) + fraction * plot_width
    };
    let y_at = |gb: f64| f64::from(PLOT_BOTTOM) - (gb - y_low) / (y_high - y_low) * plot_height;

    let points: Vec<Point> = sorted
        .iter()
        .map(|entry| Point {
            x: format!("{:.1}", x_at(entry.timestamp)),
            y: format!("{:.1}", y_at(to_gb(entry.free_bytes))),
        })
        .collect();
    let polyline = points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");

    let y_ticks = (0..Y_TICKS)
        .map(|i| {
            let gb = y_low + (y_high - y_low) * i as f64 / (Y_TICKS - 1) as f64;
            Tick {
                pos: format!("{:.1}", y_at(gb)),
                label: format!("{:.1} GB", gb),
            }
        })
        .collect();

    let x_ticks = if time_span > 0.0 {
        let middle = first + (last - first) / 2;
        [first, middle, last]
            .into_iter()
            .map(|timestamp| Tick {
                pos: format!("{:.1}", x_at(timestamp)),
                label: timestamp.format(X_LABEL_FORMAT).to_string(),
            })
            .collect()
    } else {
        vec![Tick {
            pos: format!("{:.1}", x_at(first)),
            label: first.format(X_LABEL_FORMAT).to_string(),
        }]
    };

    let template = ChartTemplate {
        title: format!("Free Disk Space Over Time - {}", volume),
        width: WIDTH,
        height: HEIGHT,
        center_x: (PLOT_LEFT + PLOT_RIGHT) / 2,
        center_y: (PLOT_TOP + PLOT_BOTTOM) / 2,
        plot_left: PLOT_LEFT,
        plot_right: PLOT_RIGHT,
        plot_top: PLOT_TOP,
        plot_bottom: PLOT_BOTTOM,
        y_label_x: PLOT_LEFT - 8,
        x_label_y: PLOT_BOTTOM + 20,
        x_title_y: HEIGHT - 15,
        y_ticks,
        x_ticks,
        polyline,
        points,
    };
    Ok(template.render()?)
}

/// Render and write a chart, replacing any previous one at `path`.
pub fn write_chart(path: &Path, volume: &str, entries: &[LogEntry]) -> Result<(), ChartError> {
    let svg = render_svg(volume, entries)?;
    std::fs::write(path, svg).map_err(|source| ChartError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(volume, path = %path.display(), points = entries.len(), "chart written");
    Ok(())
}

fn to_gb(bytes: u64) -> f64 {
    bytes as f64 / GB as f64
}

fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Y-axis bounds in GB. A flat series gets a 1 GB margin each side, floored at zero.
fn value_range(entries: &[LogEntry]) -> (f64, f64) {
    let values = entries.iter().map(|entry| to_gb(entry.free_bytes));
    let low = values.clone().fold(f64::INFINITY, f64::min);
    let high = values.fold(f64::NEG_INFINITY, f64::max);
    if high - low < 1e-9 {
        ((low - 1.0).max(0.0), high + 1.0)
    } else {
        (low, high)
    }
}
