//! Ratatui-based terminal UI.
//!
//! The pipeline runs once before the terminal is taken over. The UI then shows
//! the series with its forecast band, the ranked candidate table and the
//! diagnostics, and lets the operator switch horizon, criterion and the
//! differencing level on display.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::{run_config_from_args, RunArgs};
use crate::domain::{ForecastResult, RunConfig};
use crate::error::{AppError, StatsError};
use crate::fit::ScoringFn;
use crate::plot::PlotHorizon;

mod plotters_chart;

use plotters_chart::SeriesPlottersChart;

/// Run the pipeline, then start the TUI on its result.
pub fn run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_pipeline(&config)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(2, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, run);
    app.event_loop(&mut terminal)
}

/// Restores the terminal (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(2, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(2, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: RunConfig,
    run: RunOutput,
    horizon: PlotHorizon,
    /// Differencing level on display (0 = original series).
    level: usize,
    selected_row: usize,
    status: String,
}

impl App {
    fn new(config: RunConfig, run: RunOutput) -> Self {
        let status = format!("selected {} by {}", run.selection.best.order, run.selection.criterion.display_name());
        Self {
            config,
            run,
            horizon: PlotHorizon::Short,
            level: 0,
            selected_row: 0,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(2, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(2, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(2, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('h') => {
                self.horizon = match self.horizon {
                    PlotHorizon::Short => PlotHorizon::Long,
                    PlotHorizon::Long => PlotHorizon::Short,
                };
                self.status = format!("horizon: {} years", self.forecast().horizon);
            }
            KeyCode::Char('c') => self.cycle_criterion(),
            KeyCode::Left => {
                self.level = self.level.saturating_sub(1);
                self.status = format!("showing d={}", self.level);
            }
            KeyCode::Right => {
                if self.level < self.max_level() {
                    self.level += 1;
                }
                self.status = format!("showing d={}", self.level);
            }
            KeyCode::Up => self.selected_row = self.selected_row.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_row + 1 < self.run.selection.ranked.len() {
                    self.selected_row += 1;
                }
            }
            _ => {}
        }
        false
    }

    fn cycle_criterion(&mut self) {
        let next = self.run.selection.criterion.next();
        match pipeline::with_criterion(&self.run, next, &self.config) {
            Ok(run) => {
                self.run = run;
                self.config.criterion = next;
                self.selected_row = 0;
                self.status = format!(
                    "criterion: {} -> {}",
                    next.display_name(),
                    self.run.selection.best.order
                );
            }
            Err(err) => self.status = format!("re-rank failed: {err}"),
        }
    }

    fn max_level(&self) -> usize {
        self.run.differences.len().saturating_sub(1)
    }

    fn forecast(&self) -> &ForecastResult {
        match self.horizon {
            PlotHorizon::Short => &self.run.short,
            PlotHorizon::Long => &self.run.long,
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let run = &self.run;
        let best = &run.selection.best;
        let lines = vec![
            Line::from(vec![
                Span::styled("co2", Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " - {} {}..{} (n={}) from {}",
                    run.country,
                    run.series.start_year(),
                    run.series.end_year(),
                    run.series.len(),
                    run.source
                )),
            ]),
            Line::from(Span::styled(
                format!(
                    "model: {} | {}={:.2} | sigma^2={:.4} | Ljung-Box p={:.4} | horizon: {}",
                    best.order,
                    run.selection.criterion.display_name(),
                    run.selection.criterion.score(best),
                    best.sigma2,
                    run.residual_check.ljung_box.p_value,
                    self.forecast().horizon,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(11)])
            .split(columns[1]);

        self.draw_chart(frame, columns[0]);
        self.draw_candidates(frame, side[0]);
        self.draw_diagnostics(frame, side[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = if self.level == 0 {
            format!("Series + {} forecast", self.run.selection.best.order)
        } else {
            format!("Series differenced {} time(s)", self.level)
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let data = match chart_data(&self.run, self.level, self.horizon) {
            Ok(data) => data,
            Err(err) => {
                let msg = Paragraph::new(err.to_string()).style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
                return;
            }
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = SeriesPlottersChart {
            history: &data.history,
            mean: &data.mean,
            lower_95: &data.lower_95,
            upper_95: &data.upper_95,
            lower_80: &data.lower_80,
            upper_80: &data.upper_80,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: "year",
            y_label: "kt".to_string(),
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, data.x_bounds, data.y_bounds);
        }
    }

    fn draw_candidates(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let selection = &self.run.selection;
        let items: Vec<ListItem> = selection
            .ranked
            .iter()
            .map(|r| {
                let line = format!("{:>2} {:<14} {:>10.2}", r.rank, r.model.order.to_string(), r.score);
                let style = if r.model.order == selection.best.order {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect();

        let title = format!(
            "Candidates by {} ({} fitted, {} skipped)",
            selection.criterion.display_name(),
            selection.ranked.len(),
            selection.skipped.len()
        );
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_row));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_diagnostics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let run = &self.run;
        let mut lines: Vec<Line> = Vec::new();
        for level in &run.decision.levels {
            lines.push(Line::from(format!(
                "d={} ADF p={:.3} PP p={:.3} KPSS p={:.3} {}",
                level.order,
                level.adf.p_value,
                level.pp.p_value,
                level.kpss.p_value,
                level.verdict.label()
            )));
        }
        let decision_note = if run.decision.overridden {
            "set by operator"
        } else if run.decision.resolved {
            "tests agree"
        } else {
            "unresolved"
        };
        lines.push(Line::from(Span::styled(
            format!("chosen d={} ({decision_note})", run.decision.order),
            Style::default().add_modifier(Modifier::BOLD),
        )));

        let lb = &run.residual_check.ljung_box;
        let lb_style = if run.residual_check.accepted {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        lines.push(Line::from(Span::styled(
            format!("Ljung-Box Q={:.3} lag={} p={:.4}", lb.statistic, lb.lag, lb.p_value),
            lb_style,
        )));
        if let Some(b) = &run.baseline {
            lines.push(Line::from(format!(
                "Holt a={:.2} b={:.2} p={:.4}; more informative: {}",
                b.alpha,
                b.beta,
                b.holt_ljung_box.p_value,
                b.more_informative.label()
            )));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Diagnostics").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "h horizon  c criterion  ←/→ level  ↑/↓ candidates  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Series prepared for the chart widget.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    history: Vec<(f64, f64)>,
    mean: Vec<(f64, f64)>,
    lower_95: Vec<(f64, f64)>,
    upper_95: Vec<(f64, f64)>,
    lower_80: Vec<(f64, f64)>,
    upper_80: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for one differencing level. Forecasts are only drawn
/// on the original scale.
fn chart_data(run: &RunOutput, level: usize, horizon: PlotHorizon) -> Result<ChartData, StatsError> {
    let shown = &run
        .differences
        .get(level)
        .ok_or_else(|| StatsError::InvalidParameter(format!("no differencing level {level}")))?
        .series;
    let history: Vec<(f64, f64)> = shown.iter().map(|(y, v)| (y as f64, v)).collect();

    let forecast = match horizon {
        PlotHorizon::Short => &run.short,
        PlotHorizon::Long => &run.long,
    };
    let band = |f: fn(&crate::domain::ForecastStep) -> f64| -> Vec<(f64, f64)> {
        if level != 0 {
            return Vec::new();
        }
        history
            .last()
            .copied()
            .into_iter()
            .chain(forecast.steps.iter().map(|s| (s.year as f64, f(s))))
            .collect()
    };
    let mean = band(|s| s.mean);
    let lower_95 = band(|s| s.lower_95);
    let upper_95 = band(|s| s.upper_95);
    let lower_80 = band(|s| s.lower_80);
    let upper_80 = band(|s| s.upper_80);

    let all = || history.iter().chain(&mean).chain(&lower_95).chain(&upper_95);
    let x_bounds = bounds(all().map(|p| p.0), 0.0);
    let y_bounds = bounds(all().map(|p| p.1), 0.05);

    Ok(ChartData {
        history,
        mean,
        lower_95,
        upper_95,
        lower_80,
        upper_80,
        x_bounds,
        y_bounds,
    })
}

fn bounds(values: impl Iterator<Item = f64>, pad_frac: f64) -> [f64; 2] {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return [0.0, 1.0];
    }
    let pad = (hi - lo) * pad_frac;
    [lo - pad, hi + pad]
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if v.abs() >= 1e3 {
        format!("{:.0}k", v / 1e3)
    } else {
        format!("{v:.1}")
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("year")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}
