// src/plot_functions/plot_period_fit.rs

use plotters::backend::BitMapBackend;
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::drawing::IntoDrawingArea;
use plotters::element::{PathElement, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, WHITE};
use plotters::style::{Color, IntoFont, ShapeStyle};
use std::error::Error;
use std::path::Path;

use crate::constants::{
    COLOR_INPUT_FIT, COLOR_INPUT_RAW, COLOR_OUTPUT_FIT, COLOR_OUTPUT_RAW, LINE_WIDTH_LEGEND,
    LINE_WIDTH_PLOT, LINE_WIDTH_RAW, PLOT_HEIGHT, PLOT_WIDTH, RAW_SIGNAL_ALPHA,
};
use crate::data_analysis::sweep::PeriodAnalysis;
use crate::font_config::{
    FONT_TUPLE_AXIS_LABEL, FONT_TUPLE_CHART_TITLE, FONT_TUPLE_LEGEND, FONT_TUPLE_MAIN_TITLE,
};
use crate::plot_framework::{draw_text_box, draw_unavailable_message, range_of, PlotSeries};

/// Lines shown in the metrics box of the time-response plot.
pub fn period_metrics_lines(analysis: &PeriodAnalysis) -> Vec<String> {
    let r = &analysis.response;
    vec![
        format!("Input:  A = {:.4}  R² = {:.4}", r.input_amplitude, r.input_r_squared),
        format!("Output: A = {:.4}  R² = {:.4}", r.output_amplitude, r.output_r_squared),
        format!("Gain:   {:.2} dB", r.gain_db),
        format!("Phase:  {:.2}°", r.phase_deg),
        format!("Delay:  {:.3} s", r.delay_s),
    ]
}

fn period_series(analysis: &PeriodAnalysis) -> Vec<PlotSeries> {
    vec![
        PlotSeries::new(
            analysis.input_series().points(),
            "Input (real)",
            COLOR_INPUT_RAW,
            RAW_SIGNAL_ALPHA,
            LINE_WIDTH_RAW,
        ),
        PlotSeries::new(
            analysis.fitted_input_series().points(),
            "Input (fitted)",
            COLOR_INPUT_FIT,
            1.0,
            LINE_WIDTH_PLOT,
        ),
        PlotSeries::new(
            analysis.output_series().points(),
            "Output (real)",
            COLOR_OUTPUT_RAW,
            RAW_SIGNAL_ALPHA,
            LINE_WIDTH_RAW,
        ),
        PlotSeries::new(
            analysis.fitted_output_series().points(),
            "Output (fitted)",
            COLOR_OUTPUT_FIT,
            1.0,
            LINE_WIDTH_PLOT,
        ),
    ]
}

/// Render the analysis window of one period: real and fitted input and output
/// over time, plus a box with the fit metrics.
pub fn plot_period_fit(
    analysis: &PeriodAnalysis,
    output_file: &Path,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(output_file, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!(
        "Time Response: Input vs Output (T = {}s)",
        analysis.response.period_s
    );
    root.draw(&Text::new(
        title,
        (10, 10),
        FONT_TUPLE_MAIN_TITLE.into_font().color(&BLACK),
    ))?;

    let plot_area = root.margin(50, 5, 5, 5);
    let series = period_series(analysis);

    let x_range = range_of(analysis.window.time.iter().copied());
    let y_range = range_of(
        series
            .iter()
            .flat_map(|s| s.data.iter().map(|&(_, y)| y)),
    );
    let (x_range, y_range) = match (x_range, y_range) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            draw_unavailable_message(&plot_area, "No finite samples in the analysis window")?;
            root.present()?;
            return Ok(());
        }
    };
    // The time axis is not padded
    let time = &analysis.window.time;
    let x_range = match (time.get(0), time.get(time.len().wrapping_sub(1))) {
        (Some(&start), Some(&end)) if end > start => start..end,
        _ => x_range,
    };

    let mut chart = ChartBuilder::on(&plot_area)
        .caption("Steady-state window", FONT_TUPLE_CHART_TITLE.into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Value")
        .x_label_style(FONT_TUPLE_AXIS_LABEL.into_font())
        .y_label_style(FONT_TUPLE_AXIS_LABEL.into_font())
        .draw()?;

    for s in &series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(
                s.data.iter().copied(),
                ShapeStyle::from(&color).stroke_width(s.stroke_width),
            ))?
            .label(s.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(
                    vec![(x, y), (x + 20, y)],
                    ShapeStyle::from(&color).stroke_width(LINE_WIDTH_LEGEND),
                )
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(FONT_TUPLE_LEGEND.into_font())
        .draw()?;

    // Upper left, inside the plotting area
    draw_text_box(&plot_area, (90, 50), &period_metrics_lines(analysis))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::data_analysis::sweep::analyze_period;
    use crate::data_input::dataset::ExcitationGroup;
    use ndarray::Array1;
    use std::f64::consts::PI;

    fn analysis() -> PeriodAnalysis {
        let time: Array1<f64> = (0..600).map(|i| i as f64 / 10.0).collect();
        let setpoint = time.mapv(|t| (2.0 * PI * t / 6.0).sin());
        let controlled = time.mapv(|t| 0.5 * (2.0 * PI * t / 6.0 - PI / 2.0).sin());
        let group = ExcitationGroup::new(6.0, time, setpoint, controlled);
        analyze_period(&group, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_metrics_lines() {
        let lines = period_metrics_lines(&analysis());
        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains("-6.02 dB"), "{}", lines[2]);
        assert!(lines[3].contains("-90.00°"), "{}", lines[3]);
        assert!(lines[4].contains("1.500 s"), "{}", lines[4]);
    }

    #[test]
    fn test_four_series_of_window_length() {
        let analysis = analysis();
        let series = period_series(&analysis);
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|s| s.data.len() == analysis.window.len()));
        assert_eq!(series[3].label, "Output (fitted)");
    }
}
