// src/plot_framework.rs

use plotters::backend::BitMapBackend;
use plotters::coord::Shift;
use plotters::drawing::DrawingArea;
use plotters::element::{Rectangle, Text};
use plotters::style::colors::{BLACK, RED, WHITE};
use plotters::style::{Color, IntoFont, RGBAColor, RGBColor};

use std::error::Error;
use std::ops::Range;

use crate::font_config::{FONT_TUPLE_MESSAGE, FONT_TUPLE_METRICS};
use crate::types::PlotPoints;

/// Calculate plot range with padding.
/// Adds 15% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 { 0.5 } else { range * 0.15 };
    (min - padding, max + padding)
}

/// Padded range over every finite value, or `None` when there is none.
pub fn range_of<I>(values: I) -> Option<Range<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    let (lo, hi) = calculate_range(lo, hi);
    Some(lo..hi)
}

/// Logarithmic-axis frequency range covering all points, snapped outward to
/// whole decades so the axis always carries at least one labelled power of ten.
pub fn log_frequency_range<I>(frequencies: I) -> Option<Range<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = frequencies
        .into_iter()
        .filter(|f| f.is_finite() && *f > 0.0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
            (lo.min(f), hi.max(f))
        });
    if lo > hi {
        return None;
    }
    let lo_decade = lo.log10().floor() as i32;
    let mut hi_decade = hi.log10().ceil() as i32;
    if hi_decade <= lo_decade {
        hi_decade = lo_decade + 1;
    }
    Some(10f64.powi(lo_decade)..10f64.powi(hi_decade))
}

/// One line of a time-domain chart.
#[derive(Clone)]
pub struct PlotSeries {
    pub data: PlotPoints,
    pub label: String,
    pub color: RGBAColor,
    pub stroke_width: u32,
}

impl PlotSeries {
    pub fn new(
        data: PlotPoints,
        label: &str,
        color: &RGBColor,
        alpha: f64,
        stroke_width: u32,
    ) -> Self {
        Self {
            data,
            label: label.to_string(),
            color: color.mix(alpha),
            stroke_width,
        }
    }
}

/// Draw a centered message on a plot area, e.g. when there is nothing to plot.
pub fn draw_unavailable_message(
    area: &DrawingArea<BitMapBackend, Shift>,
    message: &str,
) -> Result<(), Box<dyn Error>> {
    // Approximate character width relative to font size
    const CHAR_WIDTH_RATIO: f32 = 0.6;

    let (x_range, y_range) = area.get_pixel_range();
    let (width, height) = (x_range.end - x_range.start, y_range.end - y_range.start);

    let estimated_text_width =
        (message.len() as f32 * FONT_TUPLE_MESSAGE.1 as f32 * CHAR_WIDTH_RATIO) as i32;
    let center_x = width / 2 - estimated_text_width / 2;
    let center_y = height / 2 - FONT_TUPLE_MESSAGE.1 / 2;

    let text_style = FONT_TUPLE_MESSAGE.into_font().color(&RED);
    area.draw(&Text::new(message.to_string(), (center_x, center_y), text_style))?;
    Ok(())
}

/// Draw a boxed block of text lines with its top-left corner at `origin` (pixels).
pub fn draw_text_box(
    area: &DrawingArea<BitMapBackend, Shift>,
    origin: (i32, i32),
    lines: &[String],
) -> Result<(), Box<dyn Error>> {
    const PADDING: i32 = 10;
    const CHAR_WIDTH_RATIO: f32 = 0.62;
    let line_height = FONT_TUPLE_METRICS.1 + 6;

    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width =
        (longest as f32 * FONT_TUPLE_METRICS.1 as f32 * CHAR_WIDTH_RATIO) as i32 + 2 * PADDING;
    let box_height = lines.len() as i32 * line_height + 2 * PADDING;
    let (x0, y0) = origin;

    area.draw(&Rectangle::new(
        [(x0, y0), (x0 + box_width, y0 + box_height)],
        WHITE.mix(0.9).filled(),
    ))?;
    area.draw(&Rectangle::new(
        [(x0, y0), (x0 + box_width, y0 + box_height)],
        BLACK.stroke_width(1),
    ))?;

    for (i, line) in lines.iter().enumerate() {
        area.draw(&Text::new(
            line.clone(),
            (x0 + PADDING, y0 + PADDING + i as i32 * line_height),
            FONT_TUPLE_METRICS.into_font().color(&BLACK),
        ))?;
    }
    Ok(())
}
