// src/plot_functions/plot_bode.rs

use plotters::backend::BitMapBackend;
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, Cross, PathElement, Text};
use plotters::prelude::IntoLogRange;
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, WHITE};
use plotters::style::{Color, IntoFont, ShapeStyle};
use std::error::Error;
use std::ops::Range;
use std::path::Path;

use crate::constants::{
    BODE_REJECTED_ALPHA, COLOR_BODE_ACCEPTED, COLOR_BODE_REJECTED, LINE_WIDTH_LEGEND,
    LINE_WIDTH_PLOT, MARKER_SIZE_ACCEPTED, MARKER_SIZE_REJECTED, PLOT_HEIGHT, PLOT_WIDTH,
};
use crate::data_analysis::frequency_response::FrequencyResponsePoint;
use crate::data_analysis::sweep::FrequencyResponseTable;
use crate::font_config::{
    FONT_TUPLE_AXIS_LABEL, FONT_TUPLE_CHART_TITLE, FONT_TUPLE_LEGEND, FONT_TUPLE_MAIN_TITLE,
};
use crate::plot_framework::{log_frequency_range, range_of};
use crate::types::PlotPoints;

/// Which quantity of a response point a panel shows.
#[derive(Clone, Copy)]
enum BodePanel {
    Magnitude,
    Phase,
}

impl BodePanel {
    fn caption(self) -> &'static str {
        match self {
            BodePanel::Magnitude => "Magnitude",
            BodePanel::Phase => "Phase",
        }
    }

    fn y_desc(self) -> &'static str {
        match self {
            BodePanel::Magnitude => "Magnitude (dB)",
            BodePanel::Phase => "Phase (degrees)",
        }
    }

    fn value(self, point: &FrequencyResponsePoint) -> f64 {
        match self {
            BodePanel::Magnitude => point.gain_db(),
            BodePanel::Phase => point.phase_deg(),
        }
    }
}

/// Render the sweep table as a two-row Bode plot (magnitude over phase).
///
/// Accepted points are joined by a line, rejected points are drawn as crosses
/// on their own. An empty table writes no file.
pub fn plot_bode_sweep(
    table: &FrequencyResponseTable,
    output_file: &Path,
    window_s: f64,
) -> Result<(), Box<dyn Error>> {
    if table.is_empty() {
        println!("  No results to plot.");
        return Ok(());
    }

    let freq_range = log_frequency_range(table.iter().map(|p| p.frequency_hz()))
        .ok_or("No positive frequencies to plot")?;

    let root = BitMapBackend::new(output_file, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!(
        "Bode Diagram (least-squares sine fit, last {}s of each period)",
        window_s
    );
    root.draw(&Text::new(
        title,
        (10, 10),
        FONT_TUPLE_MAIN_TITLE.into_font().color(&BLACK),
    ))?;

    let areas = root.margin(50, 5, 5, 5).split_evenly((2, 1));
    draw_bode_panel(&areas[0], table, BodePanel::Magnitude, freq_range.clone())?;
    draw_bode_panel(&areas[1], table, BodePanel::Phase, freq_range)?;

    root.present()?;
    Ok(())
}

fn draw_bode_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    table: &FrequencyResponseTable,
    panel: BodePanel,
    freq_range: Range<f64>,
) -> Result<(), Box<dyn Error>> {
    let y_range = range_of(table.iter().map(|p| panel.value(p)))
        .ok_or("No finite values to plot")?;
    let (freq_min, freq_max) = (freq_range.start, freq_range.end);

    let mut chart = ChartBuilder::on(area)
        .caption(panel.caption(), FONT_TUPLE_CHART_TITLE.into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(freq_range.log_scale(), y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc("Frequency (Hz)")
        .y_desc(panel.y_desc())
        .x_label_style(FONT_TUPLE_AXIS_LABEL.into_font())
        .y_label_style(FONT_TUPLE_AXIS_LABEL.into_font())
        .draw()?;

    // 0 dB / 0° reference line when it falls inside the axis
    if y_range.start <= 0.0 && y_range.end >= 0.0 {
        chart.draw_series(LineSeries::new(
            vec![(freq_min, 0.0), (freq_max, 0.0)],
            ShapeStyle::from(&BLACK).stroke_width(1),
        ))?;
    }

    let accepted: PlotPoints = table
        .accepted()
        .into_iter()
        .map(|p| (p.frequency_hz(), panel.value(p)))
        .collect();
    let rejected: PlotPoints = table
        .rejected()
        .into_iter()
        .map(|p| (p.frequency_hz(), panel.value(p)))
        .collect();

    let accepted_style = ShapeStyle::from(COLOR_BODE_ACCEPTED).stroke_width(LINE_WIDTH_PLOT);
    let rejected_style = ShapeStyle::from(&COLOR_BODE_REJECTED.mix(BODE_REJECTED_ALPHA))
        .stroke_width(LINE_WIDTH_PLOT);

    if !accepted.is_empty() {
        chart
            .draw_series(LineSeries::new(accepted.clone(), accepted_style))?
            .label("Accepted")
            .legend(move |(x, y)| {
                PathElement::new(
                    vec![(x, y), (x + 20, y)],
                    ShapeStyle::from(COLOR_BODE_ACCEPTED).stroke_width(LINE_WIDTH_LEGEND),
                )
            });
        chart.draw_series(accepted.iter().map(|&(f, v)| {
            Circle::new((f, v), MARKER_SIZE_ACCEPTED, accepted_style.filled())
        }))?;
    }

    if !rejected.is_empty() {
        chart
            .draw_series(
                rejected
                    .iter()
                    .map(|&(f, v)| Cross::new((f, v), MARKER_SIZE_REJECTED, rejected_style)),
            )?
            .label("Rejected")
            .legend(move |(x, y)| Cross::new((x + 10, y), MARKER_SIZE_REJECTED, rejected_style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(FONT_TUPLE_LEGEND.into_font())
        .draw()?;

    Ok(())
}
