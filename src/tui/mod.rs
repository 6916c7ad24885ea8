//! Full-screen terminal view of the fit.
//!
//! Shows the fitted experience curve over the observed level thresholds,
//! with the calibrated parameters and the largest residuals on each side.
//! Everything is computed before the UI starts; the view only presents.

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
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::pipeline::RunOutput;
use crate::domain::Residual;
use crate::error::AppError;
use crate::models::exponential;

mod curve_chart;

use curve_chart::XpPlottersChart;

/// Start the TUI over an already-computed fit run.
pub fn run(output: &RunOutput) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App {
        run: output,
        show_tables: true,
        status: format!("{} levels fitted.", output.stats.n_points),
    };
    app.event_loop(&mut terminal)
}

/// Restores the terminal (raw mode off, alternate screen left) when dropped,
/// including on the error paths out of the event loop.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

struct App<'a> {
    run: &'a RunOutput,
    show_tables: bool,
    status: String,
}

impl App<'_> {
    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Draw failed: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Input poll failed: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Input read failed: {e}")))? {
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

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('t') => {
                self.show_tables = !self.show_tables;
                self.status = if self.show_tables {
                    "Showing residual tables.".to_string()
                } else {
                    "Showing fitted parameters.".to_string()
                };
            }
            _ => {}
        }
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.run.stats;
        let fit = &self.run.fit;

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("xp", Style::default().fg(Color::Cyan)),
            Span::raw(" — level experience curve fit"),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "points: n={} | x=[{:.0}, {:.0}] | y=[{:.0}, {:.0}]",
                stats.n_points, stats.x_min, stats.x_max, stats.y_min, stats.y_max
            ),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(Span::styled(
            format!(
                "a={:.4} b={:.6} c={:.4} | rmse={:.4e} | iterations={}",
                fit.params.a, fit.params.b, fit.params.c, fit.quality.rmse, fit.iterations
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        if self.show_tables {
            self.draw_tables(frame, chunks[1]);
        } else {
            self.draw_params(frame, chunks[1]);
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("XP Curve").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (curve, points, above, below, x_bounds, y_bounds) = chart_series(self.run);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = XpPlottersChart {
            curve: &curve,
            points: &points,
            above: &above,
            below: &below,
            x_bounds,
            y_bounds,
            x_label: "x",
            y_label: "y",
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_tables(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        draw_extreme_list(frame, chunks[0], "Above curve", &self.run.extremes.above, Color::Green);
        draw_extreme_list(frame, chunks[1], "Below curve", &self.run.extremes.below, Color::Red);
    }

    fn draw_params(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let fit = &self.run.fit;
        let lines = vec![
            Line::from(format!(
                "a = {:.6}   (std err {:.3e})",
                fit.params.a,
                fit.covariance[(0, 0)].sqrt()
            )),
            Line::from(format!(
                "b = {:.6}   (std err {:.3e})",
                fit.params.b,
                fit.covariance[(1, 1)].sqrt()
            )),
            Line::from(format!(
                "c = {:.6}   (std err {:.3e})",
                fit.params.c,
                fit.covariance[(2, 2)].sqrt()
            )),
            Line::from(format!(
                "SSE {:.6e} | RMSE {:.6e} | iterations {}",
                fit.quality.sse, fit.quality.rmse, fit.iterations
            )),
        ];

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Fitted parameters").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "t tables/params  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_extreme_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    rows: &[Residual],
    color: Color,
) {
    let items: Vec<ListItem> = rows
        .iter()
        .map(|r| ListItem::new(format!("level {:>2}: residual {:+.4e}", r.point.x, r.residual)))
        .collect();

    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .style(Style::default().fg(color));
    frame.render_widget(list, area);
}

/// Series and bounds for one chart frame, in Plotters' (x, y) tuple form.
fn chart_series(
    run: &RunOutput,
) -> (
    Vec<(f64, f64)>,
    Vec<(f64, f64)>,
    Vec<(f64, f64)>,
    Vec<(f64, f64)>,
    [f64; 2],
    [f64; 2],
) {
    let as_xy = |r: &Residual| (r.point.x, r.point.y);

    let (x0, x1) = match (run.stats.x_min, run.stats.x_max) {
        (lo, hi) if lo.is_finite() && hi.is_finite() && hi > lo => (lo, hi),
        _ => (0.0, 50.0),
    };

    let points: Vec<(f64, f64)> = run.residuals.iter().map(as_xy).collect();
    let above: Vec<(f64, f64)> = run.extremes.above.iter().map(as_xy).collect();
    let below: Vec<(f64, f64)> = run.extremes.below.iter().map(as_xy).collect();

    const SAMPLES: usize = 200;
    let curve: Vec<(f64, f64)> = (0..SAMPLES)
        .map(|i| {
            let x = x0 + (x1 - x0) * i as f64 / (SAMPLES - 1) as f64;
            (x, exponential::predict(&run.fit.params, x))
        })
        .collect();

    let (mut y_min, mut y_max) = points
        .iter()
        .chain(&curve)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    (
        curve,
        points,
        above,
        below,
        [x0, x1],
        [y_min - pad, y_max + pad],
    )
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.2e}")
}

/// Gutters reserved around the Plotters rectangle for hand-drawn tick labels.
#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

/// Carve the plot rectangle out of `inner`. Areas too small for gutters get
/// the whole rectangle back and skip the tick labels entirely.
fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    let too_narrow = inner.width <= insets.left + insets.right + 10;
    let too_short = inner.height <= insets.top + insets.bottom + 5;
    if too_narrow || too_short {
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

/// Evenly spaced tick positions over a span of cells: (cell offset, value).
fn tick_marks(cells: u16, bounds: [f64; 2], count: usize) -> Vec<(u16, f64)> {
    (0..count)
        .map(|i| {
            let u = i as f64 / (count - 1) as f64;
            let cell = ((cells - 1) as f64 * u).round() as u16;
            (cell, bounds[0] + u * (bounds[1] - bounds[0]))
        })
        .collect()
}

/// Tick labels and axis names around the chart rectangle. Plotters draws the
/// axes themselves; terminal cells are too coarse for its text, so the labels
/// are placed in the gutters as one-line Paragraphs.
fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let style = Style::default().fg(Color::Gray);
    let tick_row = chart.y + chart.height;

    if tick_row < inner.y + inner.height - 1 {
        for (dx, value) in tick_marks(chart.width, x_bounds, 5) {
            let label = fmt_axis_x(value);
            let width = label.len() as u16;
            let x = (chart.x + dx).saturating_sub(width / 2);
            frame.render_widget(
                Paragraph::new(label).style(style),
                Rect {
                    x,
                    y: tick_row,
                    width,
                    height: 1,
                },
            );
        }
    }

    let gutter_end = inner.x + insets.left.saturating_sub(1);
    for (dy, value) in tick_marks(chart.height, y_bounds, 5) {
        let label = fmt_axis_y(value);
        let width = label.len() as u16;
        let x = gutter_end.saturating_sub(width);
        if x < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x,
                y: chart.y + (chart.height - 1) - dy,
                width,
                height: 1,
            },
        );
    }

    let x_name = Paragraph::new("x").alignment(Alignment::Center).style(style);
    let x_rect = Rect {
        x: chart.x,
        y: tick_row + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_name, x_rect);
    }

    let y_name = Paragraph::new("y").style(style.add_modifier(Modifier::BOLD));
    frame.render_widget(
        y_name,
        Rect {
            x: inner.x,
            y: inner.y,
            width: insets.left.saturating_sub(1),
            height: 1,
        },
    );
}
