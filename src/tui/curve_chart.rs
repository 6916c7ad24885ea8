//! Plotters-backed chart widget for the fitted curve.
//!
//! Ratatui ships its own `Chart` widget, but Plotters gives us proper axis
//! rendering, tick formatting and a series legend for free, so the chart is
//! drawn with Plotters and blitted into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

const CURVE_COLOR: RGBColor = RGBColor(0, 255, 255);
const POINT_COLOR: RGBColor = WHITE;
const ABOVE_COLOR: RGBColor = RGBColor(0, 255, 0);
const BELOW_COLOR: RGBColor = RGBColor(255, 0, 0);

/// Render-only description of one chart frame.
///
/// Series and bounds are computed by the caller; this type owns nothing and
/// decides nothing, so the data preparation stays testable on its own.
pub struct XpPlottersChart<'a> {
    /// Line series for the fitted curve.
    pub curve: &'a [(f64, f64)],
    /// Scatter series for all observed level thresholds.
    pub points: &'a [(f64, f64)],
    /// Levels farthest above the curve (a subset of `points`).
    pub above: &'a [(f64, f64)],
    /// Levels farthest below the curve (a subset of `points`).
    pub below: &'a [(f64, f64)],
    /// X bounds (level).
    pub x_bounds: [f64; 2],
    /// Y bounds (cumulative experience).
    pub y_bounds: [f64; 2],
    /// Axis descriptions.
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Tick label formatting.
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for XpPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters can fail to lay out a chart in a handful of cells; show a
        // hint instead of risking a panic inside the draw call.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Terminal too small for the chart.",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        // The backend turns Plotters primitives into buffer cells; the
        // crate-provided helper keeps its internal types out of this module.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Label areas are measured in terminal cells, so keep them
                // tight; anything bigger starves the plot area.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .margin(1)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines turn into solid character noise at terminal
            // resolution; axes plus tick labels carry enough structure.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            chart
                .draw_series(LineSeries::new(self.curve.iter().copied(), &CURVE_COLOR))?
                .label("Fit")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], CURVE_COLOR));

            // `Circle` markers are avoided on purpose: the backend currently
            // maps circle radii from pixels into normalized canvas units and
            // produces huge blobs. A single `Pixel` per observation reads as
            // a clean dot and overrides whatever the curve drew underneath.
            chart
                .draw_series(
                    self.points
                        .iter()
                        .map(|&(x, y)| Pixel::new((x, y), POINT_COLOR)),
                )?
                .label("Data")
                .legend(|(x, y)| Pixel::new((x + 5, y), POINT_COLOR));

            let above = chart.draw_series(
                self.above
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), ABOVE_COLOR)),
            )?;
            if !self.above.is_empty() {
                above
                    .label("Above")
                    .legend(|(x, y)| Pixel::new((x + 5, y), ABOVE_COLOR));
            }
            let below = chart.draw_series(
                self.below
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), BELOW_COLOR)),
            )?;
            if !self.below.is_empty() {
                below
                    .label("Below")
                    .legend(|(x, y)| Pixel::new((x + 5, y), BELOW_COLOR));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(("sans-serif", 10).into_font().color(&WHITE))
                .border_style(&WHITE)
                .draw()?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
