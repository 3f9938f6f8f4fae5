// Terminal chart surface - Draws the wind chart into an offscreen buffer
use crate::application::chart_surface::{ChartSurface, DrawContext};
use crate::application::errors::{RenderInitError, RenderUpdateError};
use crate::domain::chart::{AxisPosition, ChartSpec};
use crate::domain::window::SlidingWindow;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Widget};
use std::cell::RefCell;
use std::rc::Rc;

pub const MIN_CHART_WIDTH: u16 = 24;
pub const MIN_CHART_HEIGHT: u16 = 6;
const RIGHT_AXIS_GUTTER: u16 = 5;

struct CanvasState {
    area: Rect,
    /// Bumped on every resize; contexts from an older generation are stale.
    generation: u64,
    buffer: Buffer,
}

/// The chart region of the terminal. Cloning shares the same region.
#[derive(Clone)]
pub struct ChartCanvas {
    state: Rc<RefCell<CanvasState>>,
}

impl ChartCanvas {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(CanvasState {
                area: Rect::default(),
                generation: 0,
                buffer: Buffer::empty(Rect::default()),
            })),
        }
    }

    #[cfg(test)]
    pub fn area(&self) -> Rect {
        self.state.borrow().area
    }

    pub fn resize(&self, area: Rect) {
        let mut state = self.state.borrow_mut();
        if state.area != area {
            state.area = area;
            state.generation += 1;
            state.buffer = Buffer::empty(area);
            tracing::debug!("Chart surface resized to {}x{}", area.width, area.height);
        }
    }

    /// Copy the last drawn chart into `buf`, clipped to its area.
    pub fn paint(&self, buf: &mut Buffer) {
        let state = self.state.borrow();
        let area = state.area.intersection(buf.area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let (Some(src), Some(dst)) = (state.buffer.cell((x, y)), buf.cell_mut((x, y))) {
                    *dst = src.clone();
                }
            }
        }
    }
}

impl Default for ChartCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartSurface for ChartCanvas {
    type Context = CanvasContext;

    fn acquire(&self) -> Result<CanvasContext, RenderInitError> {
        let state = self.state.borrow();
        let Rect { width, height, .. } = state.area;
        if state.area.is_empty() {
            return Err(RenderInitError::NoSurface);
        }
        if width < MIN_CHART_WIDTH || height < MIN_CHART_HEIGHT {
            return Err(RenderInitError::TooSmall { width, height });
        }
        Ok(CanvasContext {
            canvas: self.clone(),
            generation: state.generation,
        })
    }
}

pub struct CanvasContext {
    canvas: ChartCanvas,
    generation: u64,
}

impl DrawContext for CanvasContext {
    fn draw(&mut self, spec: &ChartSpec, window: &SlidingWindow) -> Result<(), RenderUpdateError> {
        let mut state = self
            .canvas
            .state
            .try_borrow_mut()
            .map_err(|_| RenderUpdateError::Draw("canvas is busy".to_string()))?;
        if state.generation != self.generation {
            return Err(RenderUpdateError::ContextLost);
        }

        let area = state.area;
        state.buffer.reset();
        render_chart(spec, window, area, &mut state.buffer);
        Ok(())
    }

    fn release(&mut self) {
        if let Ok(mut state) = self.canvas.state.try_borrow_mut() {
            if state.generation == self.generation {
                state.buffer.reset();
            }
        }
    }
}

/// Draws every series against the left axis; right-axis series are
/// rescaled onto it and their own scale is printed in a gutter.
pub fn render_chart(spec: &ChartSpec, window: &SlidingWindow, area: Rect, buf: &mut Buffer) {
    let values_on = |position: AxisPosition| -> Vec<f64> {
        spec.series
            .iter()
            .filter(|s| s.axis == position)
            .flat_map(|s| s.source.values(window).iter().copied())
            .collect()
    };

    let left = spec.axis(AxisPosition::Left);
    let right = spec.axis(AxisPosition::Right);
    let left_bounds = left
        .map(|a| a.bounds(&values_on(AxisPosition::Left)))
        .unwrap_or([0.0, 1.0]);
    let right_bounds = right.map(|a| a.bounds(&values_on(AxisPosition::Right)));

    let points: Vec<Vec<(f64, f64)>> = spec
        .series
        .iter()
        .map(|series| {
            series
                .source
                .values(window)
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let y = match (series.axis, right_bounds) {
                        (AxisPosition::Right, Some(rb)) => rescale(v, rb, left_bounds),
                        _ => v,
                    };
                    (i as f64, y)
                })
                .collect()
        })
        .collect();

    let datasets: Vec<Dataset> = spec
        .series
        .iter()
        .zip(&points)
        .map(|(series, data)| {
            let (r, g, b) = series.color;
            Dataset::default()
                .name(series.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Rgb(r, g, b)))
                .data(data)
        })
        .collect();

    let labels = window.labels();
    let x_labels: Vec<String> = if window.is_empty() {
        Vec::new()
    } else if labels.len() == 1 {
        vec![labels[0].clone()]
    } else {
        vec![labels[0].clone(), labels[labels.len() - 1].clone()]
    };
    let x_max = (window.len().saturating_sub(1) as f64).max(1.0);
    let [y_min, y_max] = left_bounds;

    let mut y_axis = Axis::default()
        .bounds(left_bounds)
        .labels(vec![
            format!("{:.1}", y_min),
            format!("{:.1}", (y_min + y_max) / 2.0),
            format!("{:.1}", y_max),
        ])
        .style(Style::default().fg(Color::Gray));
    if let Some(axis) = left {
        y_axis = y_axis.title(axis.title.clone());
    }

    let chart_area = match right_bounds {
        Some(_) if area.width > RIGHT_AXIS_GUTTER => Rect {
            width: area.width - RIGHT_AXIS_GUTTER,
            ..area
        },
        _ => area,
    };

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels)
                .style(Style::default().fg(Color::Gray)),
        )
        .y_axis(y_axis)
        .render(chart_area, buf);

    if let Some([r_min, r_max]) = right_bounds {
        if chart_area.width < area.width {
            let x = chart_area.right() + 1;
            // Plot rows end above the x-axis line and its labels.
            let bottom = area.bottom().saturating_sub(3).max(area.top());
            let middle = area.top() + (bottom - area.top()) / 2;
            let style = Style::default().fg(Color::Gray);
            buf.set_string(x, area.top(), format!("{:>4.0}", r_max), style);
            buf.set_string(x, middle, format!("{:>4.0}", (r_min + r_max) / 2.0), style);
            buf.set_string(x, bottom, format!("{:>4.0}", r_min), style);
        }
    }
}

fn rescale(value: f64, from: [f64; 2], to: [f64; 2]) -> f64 {
    let span = from[1] - from[0];
    if span == 0.0 {
        return to[0];
    }
    to[0] + (value - from[0]) / span * (to[1] - to[0])
}
