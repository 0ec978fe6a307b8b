//! ASCII plotting for terminal output.
//!
//! Fixed-size grid, deterministic output. Plot elements:
//! - observed values: `o`
//! - forecast mean: `-` line starting at the last observation
//! - 95% interval bounds: `:`

use crate::app::pipeline::RunOutput;
use crate::domain::{ForecastResult, TimeSeries};
use crate::io::ReportFile;

/// Which of the two stored forecast horizons to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotHorizon {
    Short,
    Long,
}

/// Render a run with its short or long ARIMA forecast.
pub fn render_run_plot(run: &RunOutput, horizon: PlotHorizon, width: usize, height: usize) -> String {
    let forecast = match horizon {
        PlotHorizon::Short => &run.short,
        PlotHorizon::Long => &run.long,
    };
    render_forecast_plot(&run.series, forecast, width, height)
}

/// Render a saved report file without refitting.
pub fn render_from_report(report: &ReportFile, horizon: PlotHorizon, width: usize, height: usize) -> String {
    let mut out = format!(
        "{} {} | {} | selected {}\n",
        report.run.country,
        report.run.indicators.join("+"),
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.run.selection.best.order
    );
    out.push_str(&render_run_plot(&report.run, horizon, width, height));
    out
}

/// Render observed values and a forecast with its 95% band.
pub fn render_forecast_plot(series: &TimeSeries, forecast: &ForecastResult, width: usize, height: usize) -> String {
    let history: Vec<(f64, f64)> = series.iter().map(|(y, v)| (y as f64, v)).collect();

    let anchor = history.last().copied();
    let with_anchor = |f: &dyn Fn(&crate::domain::ForecastStep) -> f64| -> Vec<(f64, f64)> {
        anchor
            .into_iter()
            .chain(forecast.steps.iter().map(|s| (s.year as f64, f(s))))
            .collect()
    };
    let mean = with_anchor(&|s| s.mean);
    let lower = with_anchor(&|s| s.lower_95);
    let upper = with_anchor(&|s| s.upper_95);

    render_plot(&history, &mean, &lower, &upper, width, height)
}

fn render_plot(
    history: &[(f64, f64)],
    mean: &[(f64, f64)],
    lower: &[(f64, f64)],
    upper: &[(f64, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = || history.iter().chain(mean).chain(lower).chain(upper);
    let (x_min, x_max) = range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Mean first so the band never hides it; points overlay both.
    draw_polyline(&mut grid, mean, (x_min, x_max), (y_min, y_max), '-');
    draw_polyline(&mut grid, upper, (x_min, x_max), (y_min, y_max), ':');
    draw_polyline(&mut grid, lower, (x_min, x_max), (y_min, y_max), ':');
    for &(x, y) in history {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: years=[{x_min:.0}, {x_max:.0}] | value=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&year_axis(x_min, x_max, width));
    out.push('\n');
    out.push_str("o observed  - forecast  : 95% bounds\n");
    out
}

fn year_axis(x_min: f64, x_max: f64, width: usize) -> String {
    let left = format!("{x_min:.0}");
    let right = format!("{x_max:.0}");
    if width >= left.len() + right.len() + 1 {
        format!("{left}{}{right}", " ".repeat(width - left.len() - right.len()))
    } else {
        left
    }
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Largest value on row 0.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(f64, f64)], xr: (f64, f64), yr: (f64, f64), ch: char) {
    let height = grid.len();
    let width = grid[0].len();
    let cells: Vec<(usize, usize)> = points
        .iter()
        .map(|&(x, y)| (map_x(x, xr.0, xr.1, width), map_y(y, yr.0, yr.1, height)))
        .collect();
    match cells.as_slice() {
        [] => {}
        [(x, y)] => {
            if grid[*y][*x] == ' ' {
                grid[*y][*x] = ch;
            }
        }
        _ => {
            for pair in cells.windows(2) {
                draw_line(grid, pair[0], pair[1], ch);
            }
        }
    }
}

/// Integer line drawing (Bresenham); only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastStep;

    #[test]
    fn plot_golden_snapshot_small() {
        let series = TimeSeries::new(2000, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let forecast = ForecastResult {
            horizon: 1,
            steps: vec![ForecastStep {
                year: 2004,
                mean: 4.0,
                se: 1.0,
                lower_80: 3.0,
                upper_80: 5.0,
                lower_95: 2.0,
                upper_95: 6.0,
            }],
        };

        let txt = render_forecast_plot(&series, &forecast, 10, 5);
        let expected = concat!(
            "Plot: years=[2000, 2004] | value=[-0.30, 6.30]\n",
            "         :\n",
            "        --\n",
            "       o  \n",
            "  o  o  ::\n",
            "o         \n",
            "2000  2004\n",
            "o observed  - forecast  : 95% bounds\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_forecast_still_plots_history() {
        let series = TimeSeries::new(1990, vec![1.0, 2.0, 4.0]).unwrap();
        let forecast = ForecastResult { horizon: 0, steps: Vec::new() };
        let txt = render_forecast_plot(&series, &forecast, 20, 6);
        let grid: Vec<&str> = txt.lines().skip(1).take(6).collect();
        assert_eq!(grid.iter().map(|row| row.matches('o').count()).sum::<usize>(), 3);
        assert!(grid.iter().all(|row| !row.contains(':')));
    }
}
